//! Homework domain model

use serde_json::Value;
use std::str::FromStr;

use crate::error::{HomeworkError, Result};

/// Review status of a submission
///
/// The set is closed: any other status string reported by the API is an
/// [`HomeworkError::UnknownStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    /// Reviewed and accepted
    Approved,

    /// Taken by a reviewer
    Reviewing,

    /// Reviewed and returned with comments
    Rejected,
}

impl HomeworkStatus {
    /// All known statuses
    pub const ALL: [HomeworkStatus; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Status string as used by the grading API
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    /// Human-readable verdict for this status
    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Review complete: the reviewer liked everything. Hooray!",
            HomeworkStatus::Reviewing => "The submission has been taken for review.",
            HomeworkStatus::Rejected => "Review complete: the reviewer has comments.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = HomeworkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| HomeworkError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single homework submission and its review status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    pub homework_name: String,
    pub status: HomeworkStatus,
}

impl Homework {
    /// Builds a homework from one raw entry of the `homeworks` list
    ///
    /// `homework_name` is checked before `status`, so a record missing both
    /// reports the name.
    pub fn from_record(record: &Value) -> Result<Self> {
        let homework_name = string_field(record, "homework_name")?;
        let status = string_field(record, "status")?.parse()?;

        Ok(Self {
            homework_name: homework_name.to_string(),
            status,
        })
    }

    /// Message announcing this homework's current status
    pub fn status_message(&self) -> String {
        format!(
            "Status changed for submission \"{}\". {}",
            self.homework_name,
            self.status.verdict()
        )
    }
}

fn string_field<'a>(record: &'a Value, key: &'static str) -> Result<&'a str> {
    record
        .get(key)
        .ok_or(HomeworkError::MissingField(key))?
        .as_str()
        .ok_or(HomeworkError::InvalidField(key))
}
