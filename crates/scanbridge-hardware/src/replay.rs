//! File replay scanner.
//!
//! Plays back a capture of scanner output (one frame per line) so the
//! bridge can be exercised end to end without hardware. Reaching the end of
//! the file ends the stream.

use crate::error::{Result, ScannerError};
use crate::traits::ScannerDevice;
use crate::types::{DeviceInfo, ScannerKind};
use scanbridge_core::RawLine;
use scanbridge_protocol::LineFramer;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

/// Scanner replaying frames from a text file.
#[derive(Debug)]
pub struct ReplayScanner {
    path: PathBuf,
    line_delay: Duration,
    framer: LineFramer,
    open: bool,
    next_due: Option<Instant>,
}

impl ReplayScanner {
    /// Create a replay source for `path`. The file is read on `open()`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            line_delay: Duration::ZERO,
            framer: LineFramer::new(),
            open: false,
            next_due: None,
        }
    }

    /// Pace the replay: wait this long between consecutive lines.
    pub fn with_line_delay(mut self, line_delay: Duration) -> Self {
        self.line_delay = line_delay;
        self
    }

    /// Replayed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn device_name(&self) -> String {
        self.path.display().to_string()
    }
}

impl ScannerDevice for ReplayScanner {
    async fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }

        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ScannerError::unavailable(self.device_name(), e))?;

        self.framer.clear();
        self.framer.feed(&contents);
        // A final frame without terminator still counts
        self.framer.feed(b"\n");
        self.open = true;
        self.next_due = None;

        info!(
            path = %self.path.display(),
            lines = self.framer.lines_available(),
            "Replay file loaded"
        );
        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<RawLine>> {
        if !self.open {
            return Err(ScannerError::not_open(self.device_name()));
        }
        if self.framer.lines_available() == 0 {
            return Err(ScannerError::EndOfStream);
        }

        if let Some(due) = self.next_due {
            let deadline = Instant::now() + timeout;
            if due > deadline {
                sleep_until(deadline).await;
                return Ok(None);
            }
            sleep_until(due).await;
        }

        let line = self.framer.next_line().map(RawLine::new);
        if !self.line_delay.is_zero() {
            self.next_due = Some(Instant::now() + self.line_delay);
        }
        Ok(line)
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.framer.clear();
            debug!(path = %self.path.display(), "Replay closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Replay Scanner", self.device_name(), ScannerKind::Replay)
    }
}
