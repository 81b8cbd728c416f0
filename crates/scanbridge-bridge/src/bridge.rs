//! The bridge loop.
//!
//! ```text
//!            open ok                      fatal read error
//! Connecting ───────> Listening ──────────────────────────> Disconnected
//!     ^  │                │ cancelled / end of stream            │
//!     │  │ open failed    v                                      │
//!     │  └──────────> ShuttingDown ──> Stopped                   │
//!     └──────────────────────────────────────────────────────────┘
//! ```
//!
//! One iteration of `Listening` reads at most one line, classifies it and
//! forwards it. Whatever goes wrong inside an iteration (including a panic)
//! is logged and the loop moves on; only losing the device leaves
//! `Listening`.

use crate::error::{BridgeError, Result};
use crate::state_machine::{BridgeState, StateMachine, StateTransition};
use crate::stats::{BridgeReport, BridgeStats, ExitReason};
use futures::FutureExt;
use scanbridge_core::{BridgeConfig, ReconnectPolicy};
use scanbridge_hardware::{ScannerDevice, ScannerError};
use scanbridge_network::EventForwarder;
use scanbridge_protocol::{Event, classify};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Outcome of an attempt to acquire the device.
enum Connection {
    Established,
    Cancelled,
}

/// Why `Listening` was left.
enum ListenExit {
    Cancelled,
    EndOfStream,
    DeviceLost(ScannerError),
}

/// Serial-to-HTTP bridge.
///
/// Owns the scanner for its whole lifetime and forwards every classified
/// line through `F`. The device is closed on every exit path of
/// [`run`](Self::run).
///
/// # Example
///
/// ```no_run
/// use scanbridge_bridge::Bridge;
/// use scanbridge_core::BridgeConfig;
/// use scanbridge_hardware::SerialScanner;
/// use scanbridge_network::HttpForwarder;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BridgeConfig::default();
/// let scanner = SerialScanner::from_config(&config);
/// let forwarder = HttpForwarder::from_config(&config)?;
///
/// let mut bridge = Bridge::new(scanner, forwarder, &config);
/// let report = bridge.run(CancellationToken::new()).await?;
/// println!("{}", report.stats);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bridge<D, F> {
    device: D,
    forwarder: F,
    poll_interval: Duration,
    reconnect: ReconnectPolicy,
    machine: StateMachine,
    stats: BridgeStats,
}

impl<D: ScannerDevice, F: EventForwarder> Bridge<D, F> {
    pub fn new(device: D, forwarder: F, config: &BridgeConfig) -> Self {
        Self {
            device,
            forwarder,
            poll_interval: config.poll_interval,
            reconnect: config.reconnect,
            machine: StateMachine::new(),
            stats: BridgeStats::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.machine.current_state()
    }

    /// Counters collected so far.
    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Recent state transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    /// Run until cancelled, the device stream ends, or the device cannot
    /// be acquired.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DeviceUnavailable`] when opening the device
    /// fails more often than the reconnect policy allows. The device is
    /// closed before returning in every case.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<BridgeReport> {
        info!(device = %self.device.info(), "Bridge starting");

        let result = self.drive(&cancel).await;
        self.shutdown().await;

        match result {
            Ok(exit) => {
                info!(%exit, stats = %self.stats, "Bridge stopped");
                Ok(BridgeReport {
                    exit,
                    stats: self.stats.clone(),
                })
            }
            Err(error) => {
                error!(%error, stats = %self.stats, "Bridge stopped with error");
                Err(error)
            }
        }
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<ExitReason> {
        loop {
            if let Connection::Cancelled = self.connect(cancel).await? {
                return Ok(ExitReason::Cancelled);
            }

            match self.listen(cancel).await {
                ListenExit::Cancelled => return Ok(ExitReason::Cancelled),
                ListenExit::EndOfStream => return Ok(ExitReason::EndOfStream),
                ListenExit::DeviceLost(error) => {
                    let pause = self.reconnect.delay.max(self.poll_interval);
                    warn!(
                        device = %self.device.info().port,
                        %error,
                        listened_ms = self.machine.time_in_current_state().as_millis() as u64,
                        retry_in_ms = pause.as_millis() as u64,
                        "Device lost, reconnecting"
                    );
                    self.close_device().await;
                    self.enter(BridgeState::Disconnected)?;
                    self.stats.reconnects += 1;

                    // A port that opens but fails every read must not spin
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(ExitReason::Cancelled),
                        _ = sleep(pause) => {}
                    }
                }
            }
        }
    }

    async fn connect(&mut self, cancel: &CancellationToken) -> Result<Connection> {
        let mut failed_attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(Connection::Cancelled);
            }

            self.enter(BridgeState::Connecting)?;
            match self.device.open().await {
                Ok(()) => {
                    self.enter(BridgeState::Listening)?;
                    info!(device = %self.device.info(), "Listening for scanner frames");
                    return Ok(Connection::Established);
                }
                Err(source) => {
                    failed_attempts += 1;
                    let device = self.device.info().port;

                    if !self.reconnect.allows_retry(failed_attempts) {
                        return Err(BridgeError::DeviceUnavailable {
                            device,
                            attempts: failed_attempts,
                            source,
                        });
                    }

                    warn!(
                        %device,
                        attempt = failed_attempts,
                        max_retries = self.reconnect.max_attempts,
                        retry_in_ms = self.reconnect.delay.as_millis() as u64,
                        error = %source,
                        "Failed to open device, retrying"
                    );
                    self.enter(BridgeState::Disconnected)?;

                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(Connection::Cancelled),
                        _ = sleep(self.reconnect.delay) => {}
                    }
                }
            }
        }
    }

    async fn listen(&mut self, cancel: &CancellationToken) -> ListenExit {
        loop {
            if cancel.is_cancelled() {
                return ListenExit::Cancelled;
            }

            match AssertUnwindSafe(self.step(cancel)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(error)) if error.is_end_of_stream() => {
                    info!("Scanner stream ended");
                    return ListenExit::EndOfStream;
                }
                Ok(Err(error)) if error.is_fatal() => return ListenExit::DeviceLost(error),
                Ok(Err(error)) => {
                    self.stats.internal_errors += 1;
                    error!(%error, "Unexpected internal error, iteration skipped");
                }
                Err(panic) => {
                    self.stats.internal_errors += 1;
                    error!(
                        panic = panic_message(panic.as_ref()),
                        "Unexpected internal error, iteration skipped"
                    );
                }
            }
        }
    }

    /// One iteration: read, classify, forward.
    async fn step(&mut self, cancel: &CancellationToken) -> std::result::Result<(), ScannerError> {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            line = self.device.read_line(self.poll_interval) => line?,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let event = classify(line.text());
        self.stats.record_event(&event);
        match &event {
            Event::Ignored => debug!(%line, "Ignored line"),
            _ => info!(
                kind = %event.kind(),
                %line,
                received_at = %line.received_at(),
                "Scanner event"
            ),
        }

        let outcome = self.forwarder.forward(&event).await;
        trace!(%outcome, "Forwarding finished");
        self.stats.record_outcome(&outcome);
        Ok(())
    }

    async fn shutdown(&mut self) {
        if self.state().is_terminal() {
            return;
        }

        if let Err(error) = self.enter(BridgeState::ShuttingDown) {
            error!(%error, "Unexpected state on shutdown");
        }
        self.close_device().await;
        if let Err(error) = self.enter(BridgeState::Stopped) {
            error!(%error, "Unexpected state on shutdown");
        }
    }

    async fn close_device(&mut self) {
        if !self.device.is_open() {
            return;
        }
        match self.device.close().await {
            Ok(()) => debug!(device = %self.device.info().port, "Device closed"),
            Err(error) => warn!(%error, "Failed to close device cleanly"),
        }
    }

    fn enter(&mut self, state: BridgeState) -> Result<()> {
        let transition = self.machine.transition_to(state)?;
        debug!(from = %transition.from, to = %transition.to, "State transition");
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanbridge_core::ReadingId;
    use scanbridge_hardware::mock::{MockScanner, MockScannerHandle};
    use scanbridge_network::ForwardOutcome;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Forwarder recording every event it is given.
    #[derive(Debug, Clone, Default)]
    struct RecordingForwarder {
        events: Arc<Mutex<Vec<Event>>>,
        outcome: Option<ForwardOutcome>,
    }

    impl RecordingForwarder {
        fn failing(outcome: ForwardOutcome) -> Self {
            Self {
                outcome: Some(outcome),
                ..Self::default()
            }
        }

        fn forwarded(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        async fn wait_for(&self, count: usize) {
            while self.events.lock().unwrap().len() < count {
                sleep(Duration::from_millis(5)).await;
            }
        }
    }

    impl EventForwarder for RecordingForwarder {
        async fn forward(&self, event: &Event) -> ForwardOutcome {
            self.events.lock().unwrap().push(event.clone());
            if !event.is_forwardable() {
                return ForwardOutcome::Skipped;
            }
            self.outcome
                .clone()
                .unwrap_or(ForwardOutcome::Delivered { status: 200 })
        }
    }

    /// Forwarder that panics on its first call.
    #[derive(Debug, Default)]
    struct PanickingForwarder {
        calls: AtomicU32,
    }

    impl EventForwarder for PanickingForwarder {
        async fn forward(&self, _event: &Event) -> ForwardOutcome {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("forwarder exploded");
            }
            ForwardOutcome::Delivered { status: 200 }
        }
    }

    fn test_config(max_attempts: u32) -> BridgeConfig {
        BridgeConfig {
            poll_interval: Duration::from_millis(10),
            reconnect: ReconnectPolicy {
                max_attempts,
                delay: Duration::from_millis(10),
            },
            ..BridgeConfig::default()
        }
    }

    fn reading(id: &str) -> Event {
        Event::NumericReading {
            id: ReadingId::new(id).unwrap(),
        }
    }

    async fn wait_open(handle: &MockScannerHandle, count: u32) {
        while handle.open_count() < count {
            sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_end_of_stream_exits_normally() {
        let (scanner, handle) = MockScanner::new();
        let forwarder = RecordingForwarder::default();
        let mut bridge = Bridge::new(scanner, forwarder.clone(), &test_config(0));

        handle.send_line("VOTER: 123").await.unwrap();
        handle.send_line("NO_MATCH").await.unwrap();
        handle.send_line("hello world").await.unwrap();
        handle.finish().await.unwrap();

        let report = bridge.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.exit, ExitReason::EndOfStream);
        assert_eq!(report.stats.lines_read, 3);
        assert_eq!(report.stats.delivered, 2);
        assert_eq!(report.stats.ignored, 1);
        assert_eq!(
            forwarder.forwarded(),
            vec![
                reading("123"),
                Event::NoMatchDiagnostic {
                    raw: "NO_MATCH".into()
                },
                Event::Ignored,
            ]
        );
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_cancellation_closes_device_once() {
        let (scanner, handle) = MockScanner::new();
        let forwarder = RecordingForwarder::default();
        let mut bridge = Bridge::new(scanner, forwarder.clone(), &test_config(0));
        let cancel = CancellationToken::new();

        let driver = async {
            handle.send_line("VOTER: 7").await.unwrap();
            forwarder.wait_for(1).await;
            cancel.cancel();
        };
        let (report, ()) = tokio::join!(bridge.run(cancel.clone()), driver);

        let report = report.unwrap();
        assert_eq!(report.exit, ExitReason::Cancelled);
        assert_eq!(report.stats.numeric_readings, 1);
        assert_eq!(handle.close_count(), 1);
        assert!(!handle.is_open());

        let last = bridge.history().back().unwrap();
        assert_eq!(last.from, BridgeState::ShuttingDown);
        assert_eq!(last.to, BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_opens() {
        let (scanner, handle) = MockScanner::new();
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &test_config(0));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = bridge.run(cancel).await.unwrap();

        assert_eq!(report.exit, ExitReason::Cancelled);
        assert_eq!(handle.open_count(), 0);
        assert_eq!(handle.close_count(), 0);
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_startup_failure_is_fatal() {
        let (scanner, handle) = MockScanner::new();
        handle.fail_next_opens(1);
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &test_config(0));

        let err = bridge.run(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(
            err,
            BridgeError::DeviceUnavailable { attempts: 1, .. }
        ));
        assert_eq!(handle.open_count(), 0);
        assert_eq!(handle.close_count(), 0);
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_startup_retries_within_policy() {
        let (scanner, handle) = MockScanner::new();
        handle.fail_next_opens(2);
        handle.send_line("VOTER: 1").await.unwrap();
        handle.finish().await.unwrap();
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &test_config(2));

        let report = bridge.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.exit, ExitReason::EndOfStream);
        assert_eq!(report.stats.delivered, 1);
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn test_startup_retries_exhausted() {
        let (scanner, handle) = MockScanner::new();
        handle.fail_next_opens(5);
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &test_config(2));

        let err = bridge.run(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(
            err,
            BridgeError::DeviceUnavailable { attempts: 3, .. }
        ));
        assert_eq!(handle.open_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_retry_delay() {
        let (scanner, handle) = MockScanner::new();
        handle.fail_next_opens(u32::MAX);
        let config = BridgeConfig {
            reconnect: ReconnectPolicy {
                max_attempts: 10,
                delay: Duration::from_secs(60),
            },
            ..test_config(0)
        };
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &config);
        let cancel = CancellationToken::new();

        let driver = async {
            sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        };
        let (report, ()) = tokio::join!(bridge.run(cancel.clone()), driver);

        assert_eq!(report.unwrap().exit, ExitReason::Cancelled);
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_device_lost_reconnects() {
        let (scanner, handle) = MockScanner::new();
        let forwarder = RecordingForwarder::default();
        let mut bridge = Bridge::new(scanner, forwarder.clone(), &test_config(0));

        handle.send_line("VOTER: 1").await.unwrap();
        handle.disconnect("cable pulled").await.unwrap();
        handle.send_line("VOTER: 2").await.unwrap();
        handle.finish().await.unwrap();

        let report = bridge.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.exit, ExitReason::EndOfStream);
        assert_eq!(report.stats.reconnects, 1);
        assert_eq!(forwarder.forwarded(), vec![reading("1"), reading("2")]);
        assert_eq!(handle.open_count(), 2);
        assert_eq!(handle.close_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_device_loss_waits_between_reopens() {
        let (scanner, handle) = MockScanner::new();
        let config = BridgeConfig {
            reconnect: ReconnectPolicy {
                max_attempts: 3,
                delay: Duration::from_secs(2),
            },
            ..test_config(0)
        };
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &config);

        for _ in 0..20 {
            handle.disconnect("EIO").await.unwrap();
        }
        handle.finish().await.unwrap();

        let started = tokio::time::Instant::now();
        let report = bridge.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.exit, ExitReason::EndOfStream);
        assert_eq!(report.stats.reconnects, 20);
        assert_eq!(handle.open_count(), 21);
        assert!(started.elapsed() >= Duration::from_secs(2) * 20);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_to_reopen() {
        let (scanner, handle) = MockScanner::new();
        let config = BridgeConfig {
            reconnect: ReconnectPolicy {
                max_attempts: 0,
                delay: Duration::from_secs(60),
            },
            ..test_config(0)
        };
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &config);
        let cancel = CancellationToken::new();

        let driver = async {
            wait_open(&handle, 1).await;
            handle.disconnect("unplugged").await.unwrap();
            while handle.is_open() {
                sleep(Duration::from_millis(5)).await;
            }
            cancel.cancel();
        };
        let (report, ()) = tokio::join!(bridge.run(cancel.clone()), driver);

        assert_eq!(report.unwrap().exit, ExitReason::Cancelled);
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
        assert_eq!(bridge.stats().reconnects, 1);
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_device_lost_and_reopen_fails() {
        let (scanner, handle) = MockScanner::new();
        let mut bridge = Bridge::new(scanner, RecordingForwarder::default(), &test_config(0));

        let driver = async {
            wait_open(&handle, 1).await;
            handle.fail_next_opens(1);
            handle.disconnect("unplugged").await.unwrap();
        };
        let (result, ()) = tokio::join!(bridge.run(CancellationToken::new()), driver);

        assert!(matches!(
            result,
            Err(BridgeError::DeviceUnavailable { .. })
        ));
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
        assert_eq!(bridge.stats().reconnects, 1);
    }

    #[tokio::test]
    async fn test_forwarding_failures_do_not_stop_loop() {
        let (scanner, handle) = MockScanner::new();
        let forwarder = RecordingForwarder::failing(ForwardOutcome::Rejected { status: 503 });
        let mut bridge = Bridge::new(scanner, forwarder.clone(), &test_config(0));

        handle.send_line("VOTER: 1").await.unwrap();
        handle.send_line("NO_MATCH").await.unwrap();
        handle.send_line("VOTER: 2").await.unwrap();
        handle.finish().await.unwrap();

        let report = bridge.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.stats.failed, 3);
        assert_eq!(report.stats.delivered, 0);
        assert_eq!(forwarder.forwarded().len(), 3);
    }

    #[tokio::test]
    async fn test_panic_in_iteration_is_contained() {
        let (scanner, handle) = MockScanner::new();
        let mut bridge = Bridge::new(scanner, PanickingForwarder::default(), &test_config(0));

        handle.send_line("VOTER: 1").await.unwrap();
        handle.send_line("VOTER: 2").await.unwrap();
        handle.finish().await.unwrap();

        let report = bridge.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.exit, ExitReason::EndOfStream);
        assert_eq!(report.stats.internal_errors, 1);
        assert_eq!(report.stats.lines_read, 2);
        assert_eq!(report.stats.delivered, 1);
        assert_eq!(bridge.forwarder().calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
