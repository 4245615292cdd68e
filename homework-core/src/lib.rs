//! Homework Core
//!
//! Domain types and pure logic for the homework status bot.
//!
//! This crate contains:
//! - Domain types: homework records and the closed set of review statuses
//! - Validation of grading API responses
//! - Rendering of status change messages
//!
//! Nothing here performs I/O; fetching and delivery live in `homework-client`.

pub mod domain;
pub mod error;

pub use domain::homework::{Homework, HomeworkStatus};
pub use domain::message::render_message;
pub use domain::response::{current_date, latest_homework};
pub use error::{HomeworkError, Result};
