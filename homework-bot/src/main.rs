//! Homework Status Bot
//!
//! Watches the most recent homework submission on the grading API and relays
//! review status changes to a Telegram chat.
//!
//! Architecture:
//! - Configuration: credentials and intervals from the environment
//! - Repositories: grading API and Bot API behind traits
//! - Scheduler: the polling state machine, paced by an injectable clock
//!
//! The bot runs until it receives Ctrl-C or SIGTERM. Missing credentials stop
//! it before any request is made.

mod config;
mod error;
mod repository;
mod scheduler;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, ConfigError};
use crate::repository::{HttpStatusRepository, Notifier, StatusRepository, TelegramNotifier};
use crate::scheduler::{StatusPoller, SystemClock};
use homework_client::{PracticumClient, TelegramClient};

/// Grading API and chat adapters handed to the poller
type Connections = (Arc<dyn StatusRepository>, Arc<dyn Notifier>);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homework_bot=info,delivery=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Homework Status Bot");

    // A local .env file, if present, fills in unset variables
    let file_vars = config::read_env_file(Path::new(".env"));
    let lookup = config::layered_lookup(|name| std::env::var(name).ok(), file_vars);

    let poller = start(lookup, connect_http)
        .context("Failed to start")
        .inspect_err(|e| error!("{:#}", e))?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    poller.run(shutdown).await;

    info!("Homework Status Bot stopped");
    Ok(())
}

/// Loads and validates configuration, then wires the poller
///
/// `connect` runs only once the configuration is complete and valid, so a
/// missing credential never builds a client.
fn start<L, C>(lookup: L, connect: C) -> Result<StatusPoller, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&Config) -> Connections,
{
    let config = Config::from_lookup(lookup)?;
    config.validate()?;
    info!(
        "Loaded configuration: chat={}, poll_interval={:?}",
        config.credentials.telegram_chat_id, config.poll_interval
    );

    let (statuses, notifier) = connect(&config);
    Ok(StatusPoller::new(
        config,
        statuses,
        notifier,
        Arc::new(SystemClock),
    ))
}

/// Builds the HTTP-backed repositories
fn connect_http(config: &Config) -> Connections {
    let practicum = PracticumClient::new(
        config.practicum_endpoint.clone(),
        config.credentials.practicum_token.clone(),
    );
    let telegram = TelegramClient::new(
        config.telegram_api_url.clone(),
        config.credentials.telegram_token.clone(),
        config.credentials.telegram_chat_id.clone(),
    );
    info!(
        "Polling {} and notifying through {}",
        practicum.endpoint(),
        telegram.base_url()
    );

    let statuses: Arc<dyn StatusRepository> = Arc::new(HttpStatusRepository::new(practicum));
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(telegram));
    (statuses, notifier)
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
