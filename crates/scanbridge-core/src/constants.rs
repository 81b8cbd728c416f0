//! Core constants for the scanner bridge.
//!
//! This module centralizes the defaults and fixed protocol values shared by
//! every crate in the workspace: the serial line settings of the scanner,
//! the backend routes, and the timing budget of the bridge loop.
//!
//! # Frame Format
//!
//! The scanner firmware emits one newline-terminated ASCII text frame per
//! scan result:
//!
//! ```text
//! VOTER: 7\r\n
//! NO_MATCH\r\n
//! ```
//!
//! Frames that mention [`NO_MATCH_TOKEN`] are diagnostics; frames with a
//! decimal digit run carry a reading id; everything else is noise.
//!
//! # Usage
//!
//! ```
//! use scanbridge_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DEFAULT_BAUD_RATE, 9600);
//! let timeout = Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 5);
//! ```

// ============================================================================
// Serial Device
// ============================================================================

/// Default serial device identifier.
///
/// The scanner is an Arduino-class board exposing a CDC-ACM port.
#[cfg(windows)]
pub const DEFAULT_DEVICE_ID: &str = "COM14";

/// Default serial device identifier.
///
/// The scanner is an Arduino-class board exposing a CDC-ACM port.
#[cfg(not(windows))]
pub const DEFAULT_DEVICE_ID: &str = "/dev/ttyACM0";

/// Default baud rate. Must match the scanner sketch.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Lowest baud rate accepted by configuration validation.
pub const MIN_BAUD_RATE: u32 = 300;

/// Highest baud rate accepted by configuration validation.
pub const MAX_BAUD_RATE: u32 = 4_000_000;

/// Blocking timeout for a single serial `read` call in milliseconds.
///
/// Reads are only issued when bytes are already available, so this only
/// bounds pathological driver behavior.
pub const SERIAL_IO_TIMEOUT_MS: u64 = 50;

/// Maximum number of bytes pulled from the serial driver per read call.
pub const READ_CHUNK_SIZE: usize = 512;

// ============================================================================
// Frame Classification
// ============================================================================

/// Token marking a "no match" diagnostic frame (compared case-insensitively).
pub const NO_MATCH_TOKEN: &str = "NO_MATCH";

/// Maximum length of a single frame in bytes.
///
/// A buffer that grows past this without a line terminator is runaway noise
/// (wrong baud rate, binary garbage) and is discarded.
pub const MAX_LINE_LENGTH: usize = 4 * 1024;

// ============================================================================
// Backend
// ============================================================================

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Route receiving numeric readings: `{"number": "<id>"}`.
pub const NUMERIC_READING_PATH: &str = "/api/arduino/number";

/// Route receiving raw diagnostic frames: `{"data": "<raw>"}`.
pub const DIAGNOSTICS_PATH: &str = "/api/arduino/data";

/// HTTP status the backend returns for an accepted event.
pub const SUCCESS_STATUS: u16 = 200;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Default TCP connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

// ============================================================================
// Bridge Loop Timing
// ============================================================================

/// Default polling tick in milliseconds.
///
/// The reader sleeps for at most one tick when no bytes are available, which
/// bounds both CPU usage and cancellation latency.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default number of extra connection attempts after a failed open.
///
/// Zero keeps the baseline behavior: a device that cannot be opened ends the
/// process and the operator restarts it after fixing connectivity.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 0;

/// Default delay between connection attempts in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_are_absolute_paths() {
        assert!(NUMERIC_READING_PATH.starts_with('/'));
        assert!(DIAGNOSTICS_PATH.starts_with('/'));
        assert_ne!(NUMERIC_READING_PATH, DIAGNOSTICS_PATH);
    }

    #[test]
    fn test_default_baud_within_bounds() {
        assert!((MIN_BAUD_RATE..=MAX_BAUD_RATE).contains(&DEFAULT_BAUD_RATE));
    }

    #[test]
    fn test_poll_interval_is_short() {
        assert!(DEFAULT_POLL_INTERVAL_MS > 0);
        assert!(DEFAULT_POLL_INTERVAL_MS < DEFAULT_REQUEST_TIMEOUT_MS);
    }
}
