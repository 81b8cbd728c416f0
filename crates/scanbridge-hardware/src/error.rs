//! Error types for scanner device operations.
//!
//! A device either cannot be acquired ([`ScannerError::Unavailable`]), goes
//! away while being read ([`ScannerError::Disconnected`]), or simply has no
//! more data ([`ScannerError::EndOfStream`]). The bridge loop reacts
//! differently to each of them.

use scanbridge_core::Error as CoreError;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScannerError>;

/// Errors that can occur during scanner device operations.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// The device could not be opened.
    #[error("Device unavailable: {device}: {reason}")]
    Unavailable { device: String, reason: String },

    /// The device was open but stopped responding or vanished.
    #[error("Device disconnected: {device}: {reason}")]
    Disconnected { device: String, reason: String },

    /// The source has no more lines (replay exhausted, mock finished).
    #[error("End of stream")]
    EndOfStream,

    /// An operation that needs an open device was called on a closed one.
    #[error("Device not open: {device}")]
    NotOpen { device: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl ScannerError {
    /// Create a new unavailable error.
    pub fn unavailable(device: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>, reason: impl ToString) -> Self {
        Self::Disconnected {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new not-open error.
    pub fn not_open(device: impl Into<String>) -> Self {
        Self::NotOpen {
            device: device.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether the current connection is unusable and must be reacquired.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Disconnected { .. } | Self::NotOpen { .. } | Self::Io(_)
        )
    }

    /// Whether the source is exhausted.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

impl From<ScannerError> for CoreError {
    fn from(error: ScannerError) -> Self {
        match error {
            ScannerError::Unavailable { device, reason } => {
                CoreError::device_unavailable(device, reason)
            }
            ScannerError::Disconnected { device, reason } => {
                CoreError::device_unavailable(device, format!("disconnected: {reason}"))
            }
            ScannerError::Io(e) => CoreError::Io(e),
            other => CoreError::internal(other.to_string()),
        }
    }
}
