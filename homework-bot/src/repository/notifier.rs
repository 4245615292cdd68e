//! Chat notifier
//!
//! Delivers messages to the configured chat. Every delivered message is
//! recorded on the `delivery` log target.

use async_trait::async_trait;
use homework_client::{ClientError, TelegramClient};
use tracing::info;

/// Sink for outgoing chat messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` to the chat
    async fn notify(&self, message: &str) -> Result<(), ClientError>;
}

/// Notifier backed by the Telegram Bot API
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), ClientError> {
        self.client.send_message(message).await?;
        info!(
            target: "delivery",
            "Message sent to chat {}: {}",
            self.client.chat_id(),
            message
        );
        Ok(())
    }
}
