//! Telegram Bot API client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::handle_response;

/// Longest text the Bot API accepts in a single message, in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 4096;

const ELLIPSIS: char = '…';

/// HTTP client that sends plain-text messages to one fixed chat
#[derive(Clone)]
pub struct TelegramClient {
    /// Bot API base URL (e.g., "https://api.telegram.org")
    base_url: String,
    /// Bot token; part of every request path
    token: String,
    /// Destination chat
    chat_id: String,
    /// HTTP client instance
    client: Client,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct BotReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    /// Create a new Bot API client
    ///
    /// # Arguments
    /// * `base_url` - Bot API base URL
    /// * `token` - Bot token issued by BotFather
    /// * `chat_id` - Chat that receives every message
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self::with_client(base_url, token, chat_id, Client::new())
    }

    /// Create a new Bot API client with a custom HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            client,
        }
    }

    /// Get the base URL of the Bot API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the destination chat
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send a plain-text message to the configured chat
    ///
    /// Texts longer than [`MAX_MESSAGE_LEN`] are truncated, so a message is
    /// always a single request. Transport errors have the request URL
    /// removed, since it contains the bot token.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let text = truncate_message(text, MAX_MESSAGE_LEN);

        debug!("Sending {} chars to chat {}", text.chars().count(), self.chat_id);
        self.send_text(&url, &text).await.map_err(strip_url)
    }

    async fn send_text(&self, url: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let reply: BotReply = handle_response(response).await?;
        if !reply.ok {
            return Err(ClientError::Rejected(
                reply
                    .description
                    .unwrap_or_else(|| "sendMessage failed".to_string()),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

fn strip_url(err: ClientError) -> ClientError {
    match err {
        ClientError::RequestFailed(e) => ClientError::RequestFailed(e.without_url()),
        other => other,
    }
}

/// Shortens `text` to at most `max_len` UTF-16 code units
///
/// The Bot API measures message length in UTF-16 units, so characters
/// outside the Basic Multilingual Plane count twice. A shortened text ends
/// with an ellipsis and is cut on a character boundary.
pub fn truncate_message(text: &str, max_len: usize) -> Cow<'_, str> {
    if text.encode_utf16().count() <= max_len {
        return Cow::Borrowed(text);
    }

    let budget = max_len.saturating_sub(ELLIPSIS.len_utf16());
    let mut used = 0;
    let end = text
        .char_indices()
        .find_map(|(idx, ch)| {
            used += ch.len_utf16();
            (used > budget).then_some(idx)
        })
        .unwrap_or(text.len());

    Cow::Owned(format!("{}{}", &text[..end], ELLIPSIS))
}
