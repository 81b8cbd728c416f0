use scanbridge_core::Error as CoreError;
use scanbridge_hardware::ScannerError;
use thiserror::Error;

/// Errors that end a bridge run.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The scanner could not be (re)acquired within the reconnect policy.
    #[error("Device {device} unavailable after {attempts} attempt(s): {source}")]
    DeviceUnavailable {
        device: String,
        attempts: u32,
        #[source]
        source: ScannerError,
    },

    /// Internal invariant broken (e.g. an invalid state transition).
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<BridgeError> for CoreError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::DeviceUnavailable {
                device,
                attempts,
                source,
            } => {
                let reason = match source {
                    ScannerError::Unavailable { reason, .. } => reason,
                    other => other.to_string(),
                };
                CoreError::device_unavailable(device, format!("{reason} (attempts: {attempts})"))
            }
            BridgeError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_unavailable_converts_with_hint() {
        let error = BridgeError::DeviceUnavailable {
            device: "/dev/ttyACM0".into(),
            attempts: 3,
            source: ScannerError::unavailable("/dev/ttyACM0", "No such file or directory"),
        };
        assert!(error.to_string().contains("after 3 attempt(s)"));

        let core: CoreError = error.into();
        assert!(core.is_fatal());
        assert!(core.hint().is_some());
        assert_eq!(
            core.to_string(),
            "Device unavailable: /dev/ttyACM0: No such file or directory (attempts: 3)"
        );
    }
}
