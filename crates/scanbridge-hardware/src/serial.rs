//! Serial port scanner.
//!
//! The scanner firmware prints one text frame per event on a USB CDC serial
//! port. This device polls the port without blocking: when no bytes are
//! waiting it sleeps one poll tick, so the caller stays responsive to
//! cancellation.

use crate::error::{Result, ScannerError};
use crate::traits::ScannerDevice;
use crate::types::{DeviceInfo, ScannerKind};
use scanbridge_core::constants::{
    DEFAULT_POLL_INTERVAL_MS, READ_CHUNK_SIZE, SERIAL_IO_TIMEOUT_MS,
};
use scanbridge_core::{BridgeConfig, RawLine};
use scanbridge_protocol::LineFramer;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, trace, warn};

/// Fingerprint scanner attached to a serial port (8N1, no flow control).
pub struct SerialScanner {
    device_id: String,
    baud_rate: u32,
    poll_interval: Duration,
    port: Option<Box<dyn SerialPort>>,
    framer: LineFramer,
    buffer: Vec<u8>,
}

impl SerialScanner {
    /// Create a scanner bound to `device_id`. Nothing is opened yet.
    pub fn new(device_id: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            device_id: device_id.into(),
            baud_rate,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            port: None,
            framer: LineFramer::new(),
            buffer: vec![0; READ_CHUNK_SIZE],
        }
    }

    /// Create a scanner from the bridge configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.device_id.clone(), config.baud_rate).with_poll_interval(config.poll_interval)
    }

    /// Set the idle sleep between polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Configured device identifier.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Move whatever the port has buffered into the framer.
///
/// Returns the number of bytes consumed.
fn pump(
    port: &mut Option<Box<dyn SerialPort>>,
    buffer: &mut [u8],
    device_id: &str,
    framer: &mut LineFramer,
) -> Result<usize> {
    let Some(port) = port.as_mut() else {
        return Err(ScannerError::not_open(device_id));
    };

    let available = match port.bytes_to_read() {
        Ok(n) => n as usize,
        Err(e) => return Err(ScannerError::disconnected(device_id, e)),
    };
    if available == 0 {
        return Ok(0);
    }

    let len = available.min(buffer.len());
    match port.read(&mut buffer[..len]) {
        // Bytes were announced but none came: the device went away
        Ok(0) => Err(ScannerError::disconnected(device_id, "port returned end of file")),
        Ok(n) => {
            trace!(device = %device_id, bytes = n, "Read from serial port");
            framer.feed(&buffer[..n]);
            Ok(n)
        }
        Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => Ok(0),
        Err(e) => Err(ScannerError::disconnected(device_id, e)),
    }
}

/// Wait for the next framed line, pulling bytes with `pump` until `deadline`.
///
/// The deadline is checked after every pull, so a port that streams bytes
/// without ever terminating a line still returns `None` on time.
async fn read_framed<P>(
    framer: &mut LineFramer,
    deadline: Instant,
    poll_interval: Duration,
    mut pump: P,
) -> Result<Option<RawLine>>
where
    P: FnMut(&mut LineFramer) -> Result<usize>,
{
    loop {
        if let Some(text) = framer.next_line() {
            return Ok(Some(RawLine::new(text)));
        }

        let pulled = pump(framer)?;
        let now = Instant::now();
        if now >= deadline {
            return Ok(framer.next_line().map(RawLine::new));
        }

        if pulled > 0 {
            tokio::task::yield_now().await;
        } else {
            sleep(poll_interval.min(deadline - now)).await;
        }
    }
}

impl std::fmt::Debug for SerialScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialScanner")
            .field("device_id", &self.device_id)
            .field("baud_rate", &self.baud_rate)
            .field("poll_interval", &self.poll_interval)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl ScannerDevice for SerialScanner {
    async fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.device_id, self.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(SERIAL_IO_TIMEOUT_MS))
            .open()
            .map_err(|e| ScannerError::unavailable(self.device_id.clone(), e))?;

        // Drop frames the scanner printed before we attached
        if let Err(e) = port.clear(ClearBuffer::Input) {
            warn!(device = %self.device_id, error = %e, "Failed to flush stale input");
        }
        self.framer.clear();
        self.port = Some(port);

        info!(device = %self.device_id, baud_rate = self.baud_rate, "Serial port opened");
        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<RawLine>> {
        let deadline = Instant::now() + timeout;
        let Self {
            device_id,
            poll_interval,
            port,
            framer,
            buffer,
            ..
        } = self;

        read_framed(framer, deadline, *poll_interval, |framer| {
            pump(port, buffer, device_id.as_str(), framer)
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            self.framer.clear();
            debug!(device = %self.device_id, "Serial port closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Fingerprint Scanner", self.device_id.clone(), ScannerKind::Serial)
            .with_baud_rate(self.baud_rate)
    }
}
