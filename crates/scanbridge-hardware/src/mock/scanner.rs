//! Mock fingerprint scanner for testing and development.
//!
//! This module provides a simulated scanner whose output is fed
//! programmatically through a [`MockScannerHandle`], so the bridge can be
//! exercised without a physical device.

use crate::{
    Result, ScannerError,
    traits::ScannerDevice,
    types::{DeviceInfo, ScannerKind},
};
use scanbridge_core::RawLine;
use scanbridge_protocol::LineFramer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};

/// Capacity of the frame channel between handle and scanner.
const FRAME_CHANNEL_CAPACITY: usize = 32;

/// Mock scanner for testing and development.
///
/// Bytes sent through the handle go through the same [`LineFramer`] as the
/// serial device, so partial frames and odd terminators behave identically.
///
/// # Examples
///
/// ```
/// use scanbridge_hardware::mock::MockScanner;
/// use scanbridge_hardware::traits::ScannerDevice;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> scanbridge_hardware::Result<()> {
///     let (mut scanner, handle) = MockScanner::new();
///
///     scanner.open().await?;
///     handle.send_line("VOTER: 42").await?;
///
///     let line = scanner.read_line(Duration::from_millis(100)).await?;
///     assert_eq!(line.unwrap().text(), "VOTER: 42");
///
///     scanner.close().await?;
///     assert_eq!(handle.close_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockScanner {
    /// Channel receiver for simulated output
    frame_rx: mpsc::Receiver<MockFrame>,

    /// Device name
    name: String,

    /// Line assembly
    framer: LineFramer,

    /// State shared with the handle
    shared: Arc<SharedState>,

    /// Set once the stream has ended; later reads fail immediately
    finished: bool,
}

impl MockScanner {
    /// Create a new mock scanner with the default name.
    ///
    /// Returns a tuple of (MockScanner, MockScannerHandle) where the handle
    /// drives the scanner output and observes open/close calls.
    pub fn new() -> (Self, MockScannerHandle) {
        Self::with_name("Mock Scanner")
    }

    /// Create a new mock scanner with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockScannerHandle) {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let shared = Arc::new(SharedState::default());

        let scanner = Self {
            frame_rx,
            name: name.into(),
            framer: LineFramer::new(),
            shared: Arc::clone(&shared),
            finished: false,
        };

        let handle = MockScannerHandle { frame_tx, shared };

        (scanner, handle)
    }
}

impl ScannerDevice for MockScanner {
    async fn open(&mut self) -> Result<()> {
        if self.shared.open.load(Ordering::SeqCst) {
            return Ok(());
        }

        let failing = self
            .shared
            .fail_next_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ScannerError::unavailable(
                self.name.clone(),
                "simulated open failure",
            ));
        }

        self.framer.clear();
        self.shared.open.store(true, Ordering::SeqCst);
        self.shared.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<RawLine>> {
        if !self.is_open() {
            return Err(ScannerError::not_open(self.name.clone()));
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(text) = self.framer.next_line() {
                return Ok(Some(RawLine::new(text)));
            }
            if self.finished {
                return Err(ScannerError::EndOfStream);
            }

            match timeout_at(deadline, self.frame_rx.recv()).await {
                Err(_) => return Ok(None),
                Ok(Some(MockFrame::Bytes(bytes))) => self.framer.feed(&bytes),
                Ok(Some(MockFrame::Disconnect(reason))) => {
                    return Err(ScannerError::disconnected(self.name.clone(), reason));
                }
                // Explicit end, or every handle was dropped
                Ok(Some(MockFrame::EndOfStream)) | Ok(None) => self.finished = true,
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.shared.open.swap(false, Ordering::SeqCst) {
            self.framer.clear();
            self.shared.close_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "mock", ScannerKind::Mock)
    }
}

/// Simulated device output.
#[derive(Debug, Clone)]
enum MockFrame {
    Bytes(Vec<u8>),
    Disconnect(String),
    EndOfStream,
}

#[derive(Debug, Default)]
struct SharedState {
    open: AtomicBool,
    open_count: AtomicU32,
    close_count: AtomicU32,
    fail_next_opens: AtomicU32,
}

/// Handle for controlling a mock scanner.
///
/// # Examples
///
/// ```
/// use scanbridge_hardware::mock::MockScanner;
///
/// #[tokio::main]
/// async fn main() -> scanbridge_hardware::Result<()> {
///     let (_scanner, handle) = MockScanner::new();
///
///     handle.send_line("VOTER: 7").await?;
///     handle.send_bytes(b"NO_MA").await?;
///     handle.send_bytes(b"TCH\r\n").await?;
///     handle.finish().await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockScannerHandle {
    /// Channel sender for simulated output
    frame_tx: mpsc::Sender<MockFrame>,

    /// State shared with the scanner
    shared: Arc<SharedState>,
}

impl MockScannerHandle {
    /// Emit one frame terminated with `\r\n`, as the scanner firmware does.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped and the channel is closed.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(line.len() + 2);
        bytes.extend_from_slice(line.as_bytes());
        bytes.extend_from_slice(b"\r\n");
        self.send(MockFrame::Bytes(bytes)).await
    }

    /// Emit raw bytes, without adding a terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped and the channel is closed.
    pub async fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.send(MockFrame::Bytes(bytes.to_vec())).await
    }

    /// Make the next read fail as if the cable was pulled.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped and the channel is closed.
    pub async fn disconnect(&self, reason: impl Into<String>) -> Result<()> {
        self.send(MockFrame::Disconnect(reason.into())).await
    }

    /// End the stream once the frames sent so far have been read.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped and the channel is closed.
    pub async fn finish(&self) -> Result<()> {
        self.send(MockFrame::EndOfStream).await
    }

    /// Make the next `count` calls to `open()` fail with `Unavailable`.
    pub fn fail_next_opens(&self, count: u32) {
        self.shared.fail_next_opens.store(count, Ordering::SeqCst);
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> u32 {
        self.shared.open_count.load(Ordering::SeqCst)
    }

    /// Number of closes of an open device.
    pub fn close_count(&self) -> u32 {
        self.shared.close_count.load(Ordering::SeqCst)
    }

    /// Whether the scanner is currently open.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    async fn send(&self, frame: MockFrame) -> Result<()> {
        self.frame_tx
            .send(frame)
            .await
            .map_err(|_| ScannerError::other("Mock scanner channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_read_before_open_fails() {
        let (mut scanner, _handle) = MockScanner::new();
        let err = scanner.read_line(TICK).await.unwrap_err();
        assert!(matches!(err, ScannerError::NotOpen { .. }));
    }

    #[tokio::test]
    async fn test_lines_are_framed() {
        let (mut scanner, handle) = MockScanner::new();
        scanner.open().await.unwrap();

        handle.send_bytes(b"VOT").await.unwrap();
        handle.send_bytes(b"ER: 1\r\n\r\nNO_MATCH\n").await.unwrap();

        let first = scanner.read_line(TICK).await.unwrap().unwrap();
        let second = scanner.read_line(TICK).await.unwrap().unwrap();
        assert_eq!(first.text(), "VOTER: 1");
        assert_eq!(second.text(), "NO_MATCH");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out_with_none() {
        let (mut scanner, _handle) = MockScanner::new();
        scanner.open().await.unwrap();

        let started = Instant::now();
        assert!(scanner.read_line(TICK).await.unwrap().is_none());
        assert!(started.elapsed() >= TICK);
    }

    #[tokio::test]
    async fn test_disconnect_is_fatal() {
        let (mut scanner, handle) = MockScanner::new();
        scanner.open().await.unwrap();
        handle.disconnect("cable pulled").await.unwrap();

        let err = scanner.read_line(TICK).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("cable pulled"));
    }

    #[tokio::test]
    async fn test_finish_drains_then_ends() {
        let (mut scanner, handle) = MockScanner::new();
        scanner.open().await.unwrap();
        handle.send_line("VOTER: 5").await.unwrap();
        handle.finish().await.unwrap();

        assert!(scanner.read_line(TICK).await.unwrap().is_some());
        assert!(scanner.read_line(TICK).await.unwrap_err().is_end_of_stream());
        assert!(scanner.read_line(TICK).await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_dropped_handle_ends_stream() {
        let (mut scanner, handle) = MockScanner::new();
        scanner.open().await.unwrap();
        drop(handle);

        assert!(scanner.read_line(TICK).await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_open_close_counters() {
        let (mut scanner, handle) = MockScanner::new();

        scanner.open().await.unwrap();
        scanner.open().await.unwrap();
        assert_eq!(handle.open_count(), 1);
        assert!(handle.is_open());

        scanner.close().await.unwrap();
        scanner.close().await.unwrap();
        assert_eq!(handle.close_count(), 1);
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn test_fail_next_opens() {
        let (mut scanner, handle) = MockScanner::new();
        handle.fail_next_opens(2);

        assert!(matches!(
            scanner.open().await,
            Err(ScannerError::Unavailable { .. })
        ));
        assert!(scanner.open().await.is_err());
        scanner.open().await.unwrap();

        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 0);
    }

    #[tokio::test]
    async fn test_send_after_scanner_dropped() {
        let (scanner, handle) = MockScanner::new();
        drop(scanner);
        assert!(handle.send_line("VOTER: 1").await.is_err());
    }
}
