//! Error types for response validation and message rendering

use thiserror::Error;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, HomeworkError>;

/// Errors raised while interpreting a grading API response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HomeworkError {
    /// The response body is not a JSON object
    #[error("API response is not a JSON object")]
    NotAnObject,

    /// The response object has no `homeworks` key
    #[error("API response has no `homeworks` key")]
    MissingHomeworks,

    /// `homeworks` is present but is not an array
    #[error("`homeworks` in API response is not a list")]
    HomeworksNotAList,

    /// `homeworks` is an empty array
    #[error("homework list is empty")]
    EmptyHomeworks,

    /// A homework record lacks a required key
    #[error("homework record has no `{0}` key")]
    MissingField(&'static str),

    /// A homework record key holds something other than a string
    #[error("homework record key `{0}` is not a string")]
    InvalidField(&'static str),

    /// The status is not one of the known review statuses
    #[error("unknown homework status `{0}`")]
    UnknownStatus(String),
}
