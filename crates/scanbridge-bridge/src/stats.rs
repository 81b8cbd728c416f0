//! Runtime counters and the final run report.

use scanbridge_network::ForwardOutcome;
use scanbridge_protocol::Event;
use serde::Serialize;
use std::fmt;

/// Counters kept by the bridge loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Non-empty lines read from the device.
    pub lines_read: u64,
    /// Lines classified as numeric readings.
    pub numeric_readings: u64,
    /// Lines classified as no-match diagnostics.
    pub diagnostics: u64,
    /// Lines with nothing actionable.
    pub ignored: u64,
    /// Requests answered with 200.
    pub delivered: u64,
    /// Requests rejected or not answered.
    pub failed: u64,
    /// Device losses followed by a reconnect attempt.
    pub reconnects: u64,
    /// Iterations aborted by an unexpected error or panic.
    pub internal_errors: u64,
}

impl BridgeStats {
    pub fn record_event(&mut self, event: &Event) {
        self.lines_read += 1;
        match event {
            Event::NumericReading { .. } => self.numeric_readings += 1,
            Event::NoMatchDiagnostic { .. } => self.diagnostics += 1,
            Event::Ignored => self.ignored += 1,
        }
    }

    pub fn record_outcome(&mut self, outcome: &ForwardOutcome) {
        match outcome {
            ForwardOutcome::Delivered { .. } => self.delivered += 1,
            ForwardOutcome::Rejected { .. } | ForwardOutcome::TransportFailed { .. } => {
                self.failed += 1
            }
            ForwardOutcome::Skipped => {}
        }
    }
}

impl fmt::Display for BridgeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines ({} readings, {} diagnostics, {} ignored), {} delivered, {} failed, {} reconnects, {} internal errors",
            self.lines_read,
            self.numeric_readings,
            self.diagnostics,
            self.ignored,
            self.delivered,
            self.failed,
            self.reconnects,
            self.internal_errors
        )
    }
}

/// Why the bridge loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The cancellation token fired.
    Cancelled,
    /// The device has no more data.
    EndOfStream,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Cancelled => f.write_str("cancelled"),
            ExitReason::EndOfStream => f.write_str("end of stream"),
        }
    }
}

/// Summary returned by a clean run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeReport {
    pub exit: ExitReason,
    pub stats: BridgeStats,
}
