//! Bot configuration
//!
//! Credentials and tuning knobs for the bot. Everything is read once from
//! the environment at startup and never changes afterwards.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

pub const DEFAULT_PRACTICUM_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(600);
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Errors that stop the bot before it starts polling
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required credentials are unset or empty
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// A setting is present but unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Secrets needed to talk to the grading API and the Bot API
#[derive(Clone)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"***")
            .field("telegram_token", &"***")
            .field("telegram_chat_id", &"***")
            .finish()
    }
}

/// Bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,

    /// Homework statuses endpoint of the grading API
    pub practicum_endpoint: String,

    /// Bot API base URL
    pub telegram_api_url: String,

    /// Delay between the end of one poll cycle and the start of the next
    pub poll_interval: Duration,

    /// How far back the first request looks, in days
    pub lookback_days: u32,
}

impl Config {
    /// Creates a configuration with default endpoints and intervals
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            practicum_endpoint: DEFAULT_PRACTICUM_ENDPOINT.to_string(),
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// Creates configuration from a variable source such as the environment
    ///
    /// Expected variables:
    /// - PRACTICUM_TOKEN (required)
    /// - TELEGRAM_TOKEN (required)
    /// - TELEGRAM_CHAT_ID (required)
    /// - POLL_INTERVAL (optional, seconds, default: 600)
    /// - LOOKBACK_DAYS (optional, default: 30)
    /// - PRACTICUM_ENDPOINT (optional)
    /// - TELEGRAM_API_URL (optional)
    ///
    /// Every missing credential is reported at once. Optional values that do
    /// not parse fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let practicum_token = required(PRACTICUM_TOKEN);
        let telegram_token = required(TELEGRAM_TOKEN);
        let telegram_chat_id = required(TELEGRAM_CHAT_ID);

        let (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) =
            (&practicum_token, &telegram_token, &telegram_chat_id)
        else {
            let missing = [
                (PRACTICUM_TOKEN, practicum_token.is_none()),
                (TELEGRAM_TOKEN, telegram_token.is_none()),
                (TELEGRAM_CHAT_ID, telegram_chat_id.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(ConfigError::MissingCredentials(missing));
        };

        let mut config = Self::new(Credentials {
            practicum_token: practicum_token.clone(),
            telegram_token: telegram_token.clone(),
            telegram_chat_id: telegram_chat_id.clone(),
        });

        if let Some(interval) = lookup("POLL_INTERVAL").and_then(|s| s.parse::<u64>().ok()) {
            config.poll_interval = Duration::from_secs(interval);
        }

        if let Some(days) = lookup("LOOKBACK_DAYS").and_then(|s| s.parse::<u32>().ok()) {
            config.lookback_days = days;
        }

        if let Some(endpoint) = lookup("PRACTICUM_ENDPOINT").filter(|s| !s.is_empty()) {
            config.practicum_endpoint = endpoint;
        }

        if let Some(url) = lookup("TELEGRAM_API_URL").filter(|s| !s.is_empty()) {
            config.telegram_api_url = url;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("practicum_endpoint", &self.practicum_endpoint),
            ("telegram_api_url", &self.telegram_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must not exceed {}",
                MAX_LOOKBACK_DAYS
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reads variables from a `.env` file
///
/// A missing file yields no variables; malformed lines are skipped.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let Ok(entries) = dotenvy::from_path_iter(path) else {
        debug!("No env file at {}", path.display());
        return HashMap::new();
    };

    entries
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!("Skipping line in {}: {}", path.display(), e))
                .ok()
        })
        .collect()
}

/// Looks a variable up in `env` first, then in values read from a `.env` file
pub fn layered_lookup<E>(
    env: E,
    file_vars: HashMap<String, String>,
) -> impl Fn(&str) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    move |name: &str| env(name).or_else(|| file_vars.get(name).cloned())
}
