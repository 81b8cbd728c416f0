//! Enum wrapper for scanner dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn ScannerDevice>`
//! is not available. [`AnyScanner`] picks the concrete device at runtime
//! while keeping static dispatch inside each arm.
//!
//! # Examples
//!
//! ```
//! use scanbridge_hardware::devices::AnyScanner;
//! use scanbridge_hardware::mock::MockScanner;
//! use scanbridge_hardware::traits::ScannerDevice;
//!
//! let (scanner, _handle) = MockScanner::new();
//! let any = AnyScanner::Mock(scanner);
//! assert!(!any.is_open());
//! ```

use crate::mock::MockScanner;
use crate::replay::ReplayScanner;
use crate::serial::SerialScanner;
use crate::traits::ScannerDevice;
use crate::{DeviceInfo, Result};
use scanbridge_core::RawLine;
use std::time::Duration;

/// Enum wrapper for scanner device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyScanner {
    /// Physical scanner on a serial port.
    Serial(SerialScanner),
    /// Mock scanner for development and testing.
    Mock(MockScanner),
    /// Recorded frames replayed from a file.
    Replay(ReplayScanner),
}

impl ScannerDevice for AnyScanner {
    async fn open(&mut self) -> Result<()> {
        match self {
            Self::Serial(device) => device.open().await,
            Self::Mock(device) => device.open().await,
            Self::Replay(device) => device.open().await,
        }
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<RawLine>> {
        match self {
            Self::Serial(device) => device.read_line(timeout).await,
            Self::Mock(device) => device.read_line(timeout).await,
            Self::Replay(device) => device.read_line(timeout).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Serial(device) => device.close().await,
            Self::Mock(device) => device.close().await,
            Self::Replay(device) => device.close().await,
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Serial(device) => device.is_open(),
            Self::Mock(device) => device.is_open(),
            Self::Replay(device) => device.is_open(),
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Serial(device) => device.info(),
            Self::Mock(device) => device.info(),
            Self::Replay(device) => device.info(),
        }
    }
}

impl From<SerialScanner> for AnyScanner {
    fn from(device: SerialScanner) -> Self {
        Self::Serial(device)
    }
}

impl From<MockScanner> for AnyScanner {
    fn from(device: MockScanner) -> Self {
        Self::Mock(device)
    }
}

impl From<ReplayScanner> for AnyScanner {
    fn from(device: ReplayScanner) -> Self {
        Self::Replay(device)
    }
}
