//! Scanner device trait definition.
//!
//! This module defines the contract between the bridge loop and the
//! fingerprint scanner. Implementations own the connection and turn its raw
//! bytes into [`RawLine`]s.
//!
//! The trait uses native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::DeviceInfo;
use scanbridge_core::RawLine;
use std::time::Duration;

/// Fingerprint scanner abstraction.
///
/// A scanner is a restartable source of text lines. The owner opens it,
/// pulls lines until a fatal error or end of stream, closes it, and may
/// open it again later.
///
/// # Contract
///
/// - [`open`](Self::open) binds to the configured device only and discards
///   anything the device buffered before the call.
/// - [`read_line`](Self::read_line) waits at most `timeout` and returns
///   `Ok(None)` when no complete line arrived in that window.
/// - [`close`](Self::close) is idempotent.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods
/// return `impl Future`. Use generic type parameters, or the
/// [`AnyScanner`](crate::devices::AnyScanner) enum for runtime selection:
///
/// ```no_run
/// use scanbridge_hardware::traits::ScannerDevice;
/// use scanbridge_hardware::error::Result;
/// use std::time::Duration;
///
/// async fn next_text<S: ScannerDevice>(scanner: &mut S) -> Result<Option<String>> {
///     let line = scanner.read_line(Duration::from_millis(100)).await?;
///     Ok(line.map(|l| l.into_text()))
/// }
/// ```
pub trait ScannerDevice: Send {
    /// Acquire the device.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Unavailable`](crate::ScannerError::Unavailable)
    /// with the underlying cause when the device cannot be opened.
    async fn open(&mut self) -> Result<()>;

    /// Read the next complete, non-empty line.
    ///
    /// # Errors
    ///
    /// - [`ScannerError::Disconnected`](crate::ScannerError::Disconnected) if
    ///   the device failed while reading
    /// - [`ScannerError::EndOfStream`](crate::ScannerError::EndOfStream) if the
    ///   source is exhausted
    /// - [`ScannerError::NotOpen`](crate::ScannerError::NotOpen) if the device
    ///   was never opened
    async fn read_line(&mut self, timeout: Duration) -> Result<Option<RawLine>>;

    /// Release the device. Closing a closed device is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Device identity.
    fn info(&self) -> DeviceInfo;
}
