//! Scheduler layer for the bot
//!
//! This layer owns the polling loop: it asks the grading API for changes,
//! decides what is worth announcing, and paces cycles through a [`Clock`]
//! so tests can run many cycles without waiting.

pub mod clock;
pub mod poller;

pub use clock::{Clock, SystemClock};
pub use poller::{PollState, StatusPoller};
