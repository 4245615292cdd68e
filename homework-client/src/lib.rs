//! Homework HTTP Clients
//!
//! Typed HTTP clients for the two remote services the bot talks to:
//! - [`PracticumClient`]: the homework grading API (status polling)
//! - [`TelegramClient`]: the Telegram Bot API (message delivery)
//!
//! # Example
//!
//! ```no_run
//! use homework_client::{PracticumClient, TelegramClient};
//!
//! #[tokio::main]
//! async fn main() -> homework_client::Result<()> {
//!     let practicum = PracticumClient::new(
//!         "https://practicum.yandex.ru/api/user_api/homework_statuses/",
//!         "practicum-token",
//!     );
//!     let statuses = practicum.homework_statuses(0).await?;
//!
//!     let telegram = TelegramClient::new("https://api.telegram.org", "bot-token", "12345");
//!     telegram.send_message(&statuses.to_string()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod practicum;
mod telegram;

pub use error::{ClientError, Result};
pub use practicum::PracticumClient;
pub use telegram::{MAX_MESSAGE_LEN, TelegramClient, truncate_message};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Handle an API response and deserialize JSON
///
/// Anything but `200 OK` is an [`ClientError::ApiError`] carrying the body
/// text; a body that is not valid JSON for `T` is a [`ClientError::ParseError`].
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status != StatusCode::OK {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}
