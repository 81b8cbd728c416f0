//! Scanner device abstraction layer for the scanbridge serial bridge.
//!
//! This crate owns the connection to the fingerprint scanner and turns its
//! byte stream into complete text lines. The bridge loop only sees the
//! [`ScannerDevice`] trait, so physical, mock and replayed sources are
//! interchangeable.
//!
//! # Design Philosophy
//!
//! - **Async-first**: I/O operations use native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Non-blocking**: reads poll for available bytes and sleep one short
//!   tick when there are none, so callers can cancel between polls.
//! - **Restartable**: a device can be closed and opened again; each open
//!   starts from a clean line buffer.
//!
//! # Devices
//!
//! | Device | Source |
//! |--------|--------|
//! | [`SerialScanner`] | Serial port, 8N1, no flow control |
//! | [`MockScanner`] | In-memory, driven by a [`MockScannerHandle`] |
//! | [`ReplayScanner`] | Text file, one frame per line |
//!
//! [`AnyScanner`] wraps them for runtime selection.
//!
//! # Example
//!
//! ```no_run
//! use scanbridge_hardware::{ScannerDevice, SerialScanner};
//! use std::time::Duration;
//!
//! # async fn example() -> scanbridge_hardware::Result<()> {
//! let mut scanner = SerialScanner::new("/dev/ttyACM0", 9600);
//! scanner.open().await?;
//!
//! while let Some(line) = scanner.read_line(Duration::from_millis(500)).await? {
//!     println!("{}", line.text());
//! }
//!
//! scanner.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`ScannerError`]. [`ScannerError::is_fatal`] tells the caller when the
//! connection has to be reacquired.
//!
//! [`MockScanner`]: mock::MockScanner
//! [`MockScannerHandle`]: mock::MockScannerHandle

pub mod devices;
pub mod error;
pub mod mock;
pub mod replay;
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyScanner;
pub use error::{Result, ScannerError};
pub use replay::ReplayScanner;
pub use serial::SerialScanner;
pub use traits::ScannerDevice;
pub use types::{DeviceInfo, ScannerKind};
