//! Common types shared across scanner implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of backing source for a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    /// Physical device on a serial port.
    Serial,
    /// In-memory device driven by a handle.
    Mock,
    /// Frames replayed from a file.
    Replay,
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScannerKind::Serial => "serial",
            ScannerKind::Mock => "mock",
            ScannerKind::Replay => "replay",
        };
        f.write_str(name)
    }
}

/// Scanner device information.
///
/// Contains the identity of the device handle: the port (or file) it is
/// bound to and the line speed it was opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human readable name (e.g., "Fingerprint Scanner").
    pub name: String,

    /// Device identifier: serial port, replay file path or mock name.
    pub port: String,

    /// Configured baud rate; `None` for sources without a line speed.
    pub baud_rate: Option<u32>,

    /// Backing source.
    pub kind: ScannerKind,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, port: impl Into<String>, kind: ScannerKind) -> Self {
        Self {
            name: name.into(),
            port: port.into(),
            baud_rate: None,
            kind,
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.baud_rate {
            Some(baud) => write!(f, "{} ({} @ {} baud)", self.name, self.port, baud),
            None => write!(f, "{} ({})", self.name, self.port),
        }
    }
}
