use thiserror::Error;

/// Errors surfaced by the bridge.
///
/// Two conditions of the bridge are deliberately *not* errors: undecodable
/// bytes on the wire are replaced during decoding, and a frame that is
/// neither a reading nor a diagnostic becomes an ignored event. Neither ever
/// reaches this type.
#[derive(Error, Debug)]
pub enum Error {
    // Device errors
    #[error("Device unavailable: {device}: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    // Forwarding errors
    #[error("Forwarding to {endpoint} failed: {reason}")]
    Forwarding { endpoint: String, reason: String },

    // Domain errors
    #[error("Invalid reading id: {0}")]
    InvalidReading(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Unexpected internal error: {0}")]
    Internal(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// Create a device unavailable error.
    pub fn device_unavailable(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Create a forwarding error.
    pub fn forwarding(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Forwarding {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an unexpected internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error must end the process.
    ///
    /// Only a device that cannot be acquired and an unusable configuration
    /// stop the bridge; everything else is contained to one iteration.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable { .. } | Self::Config(_) | Self::ConfigParse(_)
        )
    }

    /// Actionable hint for the operator, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DeviceUnavailable { .. } => Some(
                "check that the scanner is plugged in, that the configured port matches \
                 the one reported by the OS, that no serial monitor is holding the port, \
                 and that this user may open it (e.g. member of the dialout group)",
            ),
            Self::Forwarding { .. } => {
                Some("check that the backend is running and reachable at the configured URL")
            }
            Self::Config(_) | Self::ConfigParse(_) => {
                Some("fix the configuration file or the overriding flags and restart")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
