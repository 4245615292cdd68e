//! Status change messages

use serde_json::Value;

use super::homework::Homework;
use crate::error::Result;

/// Renders the notification text for a raw homework record
pub fn render_message(record: &Value) -> Result<String> {
    Homework::from_record(record).map(|homework| homework.status_message())
}
