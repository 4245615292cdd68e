//! Repository layer
//!
//! Repositories are thin adapters over the HTTP clients. They give the
//! poller narrow interfaces to the grading API and the chat, without any
//! business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod notifier;
mod statuses;

// Re-export traits
pub use notifier::Notifier;
pub use statuses::StatusRepository;

// Re-export implementations
pub use notifier::TelegramNotifier;
pub use statuses::HttpStatusRepository;
