//! Status poller
//!
//! Polls the grading API for the latest submission and announces status
//! changes to the chat. Failures are reported on a separate error channel.
//! Each channel remembers the last text it delivered and stays quiet while
//! that text repeats.

use homework_core::{current_date, latest_homework, render_message};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::PollError;
use crate::repository::{Notifier, StatusRepository};
use crate::scheduler::clock::Clock;

/// State carried from one poll cycle to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    /// `from_date` of the next request
    pub watermark: i64,

    /// Latest `current_date` seen from the server, if any
    pub server_date: Option<i64>,

    /// Last status message delivered to the chat
    pub last_message: String,

    /// Last error text delivered to the chat
    pub last_error_message: String,
}

impl PollState {
    pub fn new(watermark: i64) -> Self {
        Self {
            watermark,
            server_date: None,
            last_message: String::new(),
            last_error_message: String::new(),
        }
    }

    /// Moves the watermark to the server's `current_date`
    ///
    /// The first server date always replaces the startup value; after that
    /// the watermark only moves forward.
    pub fn advance_watermark(&mut self, current_date: Option<i64>) {
        let Some(date) = current_date else {
            return;
        };
        if self.server_date.is_some_and(|seen| date <= seen) {
            return;
        }
        self.server_date = Some(date);
        self.watermark = date;
    }
}

/// Poller that announces homework status changes
pub struct StatusPoller {
    config: Config,
    statuses: Arc<dyn StatusRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl StatusPoller {
    /// Creates a new status poller
    pub fn new(
        config: Config,
        statuses: Arc<dyn StatusRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            statuses,
            notifier,
            clock,
        }
    }

    /// State for the first cycle: watermark `lookback_days` before now
    ///
    /// A lookback reaching past the representable range starts at the epoch.
    pub fn initial_state(&self) -> PollState {
        let start = chrono::TimeDelta::try_days(i64::from(self.config.lookback_days))
            .and_then(|lookback| self.clock.now().checked_sub_signed(lookback))
            .map_or(0, |start| start.timestamp().max(0));
        PollState::new(start)
    }

    /// Runs poll cycles until `shutdown` is cancelled
    ///
    /// Returns the state reached when the loop stopped.
    pub async fn run(&self, shutdown: CancellationToken) -> PollState {
        info!(
            "Starting status poller (interval: {:?})",
            self.config.poll_interval
        );

        let mut state = self.initial_state();
        debug!("Initial watermark: {}", state.watermark);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.poll_once(&mut state) => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.clock.sleep(self.config.poll_interval) => {}
            }
        }

        info!("Status poller stopped (watermark: {})", state.watermark);
        state
    }

    /// Performs a single poll cycle
    ///
    /// Never fails: errors are logged and reported to the chat instead.
    pub async fn poll_once(&self, state: &mut PollState) {
        if let Err(err) = self.check_for_update(state).await {
            error!(kind = err.kind(), "Poll cycle failed: {}", err);
            self.report_error(state, err.to_string()).await;
        }
    }

    async fn check_for_update(&self, state: &mut PollState) -> Result<(), PollError> {
        let response = self
            .statuses
            .fetch_statuses(state.watermark)
            .await
            .map_err(PollError::fetch)?;

        state.advance_watermark(current_date(&response));

        let record = latest_homework(&response)?;
        let message = render_message(record)?;

        if message == state.last_message {
            debug!("No status change: {}", message);
            return Ok(());
        }

        self.notifier
            .notify(&message)
            .await
            .map_err(PollError::Notify)?;

        info!("Announced status change: {}", message);
        state.last_message = message;
        Ok(())
    }

    async fn report_error(&self, state: &mut PollState, text: String) {
        if text == state.last_error_message {
            debug!("Error already reported, not notifying again");
            return;
        }

        match self.notifier.notify(&text).await {
            Ok(()) => state.last_error_message = text,
            Err(e) => warn!("Failed to report error to chat: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use homework_client::ClientError;
    use homework_core::HomeworkStatus;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    type Response = Result<Value, ClientError>;

    /// Grading API fake driven by a script indexed by call number
    struct ScriptedStatuses {
        script: Box<dyn Fn(usize) -> Response + Send + Sync>,
        requested: Mutex<Vec<i64>>,
    }

    impl ScriptedStatuses {
        fn new(script: impl Fn(usize) -> Response + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                script: Box::new(script),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<i64> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusRepository for ScriptedStatuses {
        async fn fetch_statuses(&self, from_date: i64) -> Result<Value, ClientError> {
            let mut requested = self.requested.lock().unwrap();
            requested.push(from_date);
            (self.script)(requested.len() - 1)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        failing: AtomicBool,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<(), ClientError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError::Rejected("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    /// Clock frozen at a fixed instant; cancels `shutdown` after `cycles` sleeps
    struct ManualClock {
        now: DateTime<Utc>,
        sleeps: Mutex<Vec<Duration>>,
        cycles: usize,
        shutdown: CancellationToken,
    }

    impl ManualClock {
        fn new(cycles: usize, shutdown: CancellationToken) -> Arc<Self> {
            Arc::new(Self {
                now: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                sleeps: Mutex::new(Vec::new()),
                cycles,
                shutdown,
            })
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.now
        }

        async fn sleep(&self, duration: Duration) {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            if sleeps.len() >= self.cycles {
                self.shutdown.cancel();
            }
        }
    }

    fn test_config() -> Config {
        Config::new(Credentials {
            practicum_token: "practicum".to_string(),
            telegram_token: "telegram".to_string(),
            telegram_chat_id: "42".to_string(),
        })
    }

    fn homework(name: &str, status: &str, current_date: i64) -> Response {
        Ok(json!({
            "homeworks": [{"homework_name": name, "status": status}],
            "current_date": current_date
        }))
    }

    fn server_error() -> Response {
        Err(ClientError::api_error(500, "Internal Server Error"))
    }

    fn approved_message(name: &str) -> String {
        format!(
            "Status changed for submission \"{}\". {}",
            name,
            HomeworkStatus::Approved.verdict()
        )
    }

    /// Runs `cycles` poll cycles against the given fakes
    async fn run_cycles(
        cycles: usize,
        statuses: Arc<ScriptedStatuses>,
        notifier: Arc<RecordingNotifier>,
    ) -> (PollState, Arc<ManualClock>) {
        let shutdown = CancellationToken::new();
        let clock = ManualClock::new(cycles, shutdown.clone());
        let poller = StatusPoller::new(test_config(), statuses, notifier, clock.clone());
        let state = poller.run(shutdown).await;
        (state, clock)
    }

    #[tokio::test]
    async fn test_repeated_status_is_announced_once() {
        let statuses = ScriptedStatuses::new(|_| homework("proj1", "approved", 1000));
        let notifier = Arc::new(RecordingNotifier::default());

        let (state, _clock) = run_cycles(2, statuses.clone(), notifier.clone()).await;

        assert_eq!(notifier.sent(), vec![approved_message("proj1")]);
        assert_eq!(state.last_message, approved_message("proj1"));
        assert_eq!(state.watermark, 1000);
        assert_eq!(statuses.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_status_change_is_announced() {
        let statuses = ScriptedStatuses::new(|call| match call {
            0 | 1 => homework("proj1", "reviewing", 1000),
            _ => homework("proj1", "approved", 2000),
        });
        let notifier = Arc::new(RecordingNotifier::default());

        run_cycles(4, statuses, notifier.clone()).await;

        assert_eq!(
            notifier.sent(),
            vec![
                format!(
                    "Status changed for submission \"proj1\". {}",
                    HomeworkStatus::Reviewing.verdict()
                ),
                approved_message("proj1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_homework_list_is_reported_once() {
        let statuses = ScriptedStatuses::new(|_| Ok(json!({"homeworks": []})));
        let notifier = Arc::new(RecordingNotifier::default());

        let (state, _clock) = run_cycles(3, statuses, notifier.clone()).await;

        assert_eq!(
            notifier.sent(),
            vec!["unexpected homework API response: homework list is empty".to_string()]
        );
        assert_eq!(state.last_message, "");
    }

    #[tokio::test]
    async fn test_server_error_is_reported_once() {
        let statuses = ScriptedStatuses::new(|_| server_error());
        let notifier = Arc::new(RecordingNotifier::default());

        let (state, _clock) = run_cycles(3, statuses.clone(), notifier.clone()).await;

        assert_eq!(
            notifier.sent(),
            vec!["homework API request failed: API error (status 500): Internal Server Error"
                .to_string()]
        );
        assert_eq!(state.last_error_message, notifier.sent()[0]);
        assert_eq!(statuses.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_channels_deduplicate_independently() {
        let statuses = ScriptedStatuses::new(|call| match call % 2 {
            0 => homework("proj1", "approved", 1000),
            _ => server_error(),
        });
        let notifier = Arc::new(RecordingNotifier::default());

        run_cycles(6, statuses, notifier.clone()).await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], approved_message("proj1"));
        assert!(sent[1].starts_with("homework API request failed"));
    }

    #[tokio::test]
    async fn test_different_errors_are_each_reported() {
        let statuses = ScriptedStatuses::new(|call| match call {
            0 => server_error(),
            1 => Ok(json!({"homeworks": []})),
            _ => server_error(),
        });
        let notifier = Arc::new(RecordingNotifier::default());

        run_cycles(3, statuses, notifier.clone()).await;

        assert_eq!(notifier.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_status_is_reported() {
        let statuses = ScriptedStatuses::new(|_| homework("proj1", "lost", 1000));
        let notifier = Arc::new(RecordingNotifier::default());

        run_cycles(2, statuses, notifier.clone()).await;

        assert_eq!(
            notifier.sent(),
            vec!["homework API reported an unknown status `lost`".to_string()]
        );
    }

    #[tokio::test]
    async fn test_decode_error_is_reported() {
        let statuses = ScriptedStatuses::new(|_| {
            Err(ClientError::ParseError("expected value at line 1".to_string()))
        });
        let notifier = Arc::new(RecordingNotifier::default());

        run_cycles(1, statuses, notifier.clone()).await;

        assert!(notifier.sent()[0].starts_with("homework API response could not be decoded"));
    }

    #[tokio::test]
    async fn test_watermark_follows_server_date() {
        let shutdown = CancellationToken::new();
        let clock = ManualClock::new(1, shutdown);
        let statuses = ScriptedStatuses::new(|call| match call {
            0 => homework("proj1", "approved", 5000),
            1 => Ok(json!({"homeworks": []})),
            2 => homework("proj1", "approved", 4000),
            _ => Ok(json!({"homeworks": [], "current_date": 6000})),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = StatusPoller::new(test_config(), statuses.clone(), notifier, clock.clone());

        let mut state = poller.initial_state();
        let start = (clock.now - chrono::Duration::days(30)).timestamp();
        assert_eq!(state.watermark, start);

        for _ in 0..4 {
            poller.poll_once(&mut state).await;
        }

        assert_eq!(statuses.requested(), vec![start, 5000, 5000, 5000]);
        assert_eq!(state.watermark, 6000);
    }

    #[test]
    fn test_huge_lookback_starts_at_epoch() {
        let mut config = test_config();
        config.lookback_days = u32::MAX;
        let statuses = ScriptedStatuses::new(|_| homework("proj1", "approved", 1000));
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = ManualClock::new(1, CancellationToken::new());
        let poller = StatusPoller::new(config, statuses, notifier, clock);

        assert_eq!(poller.initial_state().watermark, 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried_next_cycle() {
        let statuses = ScriptedStatuses::new(|_| homework("proj1", "approved", 1000));
        let notifier = Arc::new(RecordingNotifier::default());
        let shutdown = CancellationToken::new();
        let clock = ManualClock::new(1, shutdown);
        let poller = StatusPoller::new(test_config(), statuses, notifier.clone(), clock);
        let mut state = poller.initial_state();

        notifier.set_failing(true);
        poller.poll_once(&mut state).await;
        assert!(notifier.sent().is_empty());
        assert_eq!(state.last_message, "");
        assert_eq!(state.last_error_message, "");

        notifier.set_failing(false);
        poller.poll_once(&mut state).await;
        assert_eq!(notifier.sent(), vec![approved_message("proj1")]);
        assert_eq!(state.last_message, approved_message("proj1"));
    }

    #[tokio::test]
    async fn test_run_sleeps_poll_interval_between_cycles() {
        let statuses = ScriptedStatuses::new(|_| homework("proj1", "approved", 1000));
        let notifier = Arc::new(RecordingNotifier::default());

        let (_state, clock) = run_cycles(3, statuses, notifier).await;

        assert_eq!(
            *clock.sleeps.lock().unwrap(),
            vec![Duration::from_secs(600); 3]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_requests() {
        let statuses = ScriptedStatuses::new(|_| homework("proj1", "approved", 1000));
        let notifier = Arc::new(RecordingNotifier::default());
        let shutdown = CancellationToken::new();
        let clock = ManualClock::new(1, shutdown.clone());
        let poller = StatusPoller::new(test_config(), statuses.clone(), notifier.clone(), clock);

        shutdown.cancel();
        poller.run(shutdown).await;

        assert!(statuses.requested().is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_first_server_date_replaces_startup_watermark() {
        let mut state = PollState::new(1_706_702_400);
        state.advance_watermark(None);
        assert_eq!(state.watermark, 1_706_702_400);
        state.advance_watermark(Some(1000));
        assert_eq!(state.watermark, 1000);
        assert_eq!(state.server_date, Some(1000));
    }

    #[test]
    fn test_watermark_never_moves_back_after_server_date() {
        let mut state = PollState::new(0);
        state.advance_watermark(Some(100));
        state.advance_watermark(Some(50));
        assert_eq!(state.watermark, 100);
        state.advance_watermark(None);
        assert_eq!(state.watermark, 100);
        state.advance_watermark(Some(150));
        assert_eq!(state.watermark, 150);
    }
}
