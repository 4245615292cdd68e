//! Grading API response validation

use serde_json::Value;

use crate::error::{HomeworkError, Result};

/// Extracts the most recent homework record from a grading API response
///
/// Only the first entry of `homeworks` is ever looked at; the API returns
/// the newest submission first.
pub fn latest_homework(response: &Value) -> Result<&Value> {
    let object = response.as_object().ok_or(HomeworkError::NotAnObject)?;
    let homeworks = object
        .get("homeworks")
        .ok_or(HomeworkError::MissingHomeworks)?
        .as_array()
        .ok_or(HomeworkError::HomeworksNotAList)?;

    homeworks.first().ok_or(HomeworkError::EmptyHomeworks)
}

/// Server timestamp to use as the next `from_date`, if the response carries one
pub fn current_date(response: &Value) -> Option<i64> {
    response.get("current_date").and_then(Value::as_i64)
}
