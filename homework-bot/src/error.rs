//! Poll cycle errors
//!
//! Every failure inside one poll cycle ends up as a [`PollError`]. The poller
//! logs it, and its text is what the chat receives on the error channel.

use homework_client::ClientError;
use homework_core::HomeworkError;
use thiserror::Error;

/// Errors raised by a single poll cycle
#[derive(Debug, Error)]
pub enum PollError {
    /// The grading API could not be reached or answered with a non-200 status
    #[error("homework API request failed: {0}")]
    Transport(#[source] ClientError),

    /// The grading API answered 200 with a body that is not JSON
    #[error("homework API response could not be decoded: {0}")]
    Decode(#[source] ClientError),

    /// The response or the homework record does not have the expected shape
    #[error("unexpected homework API response: {0}")]
    Shape(#[source] HomeworkError),

    /// The homework carries a status missing from the verdict table
    #[error("homework API reported an unknown status `{0}`")]
    UnknownStatus(String),

    /// The Bot API did not accept the notification
    #[error("failed to deliver notification: {0}")]
    Notify(#[source] ClientError),
}

impl PollError {
    /// Classifies a grading API failure
    pub fn fetch(err: ClientError) -> Self {
        if err.is_parse_error() {
            Self::Decode(err)
        } else {
            Self::Transport(err)
        }
    }

    /// Stable tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::Shape(_) => "shape",
            Self::UnknownStatus(_) => "unknown_status",
            Self::Notify(_) => "notify",
        }
    }
}

impl From<HomeworkError> for PollError {
    fn from(err: HomeworkError) -> Self {
        match err {
            HomeworkError::UnknownStatus(status) => Self::UnknownStatus(status),
            other => Self::Shape(other),
        }
    }
}
