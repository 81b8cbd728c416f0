//! The scanbridge loop: acquire the scanner, turn its lines into events and
//! forward them, surviving everything except losing the device for good.
//!
//! This crate contains the lifecycle state machine and the loop driving a
//! [`ScannerDevice`](scanbridge_hardware::ScannerDevice) into an
//! [`EventForwarder`](scanbridge_network::EventForwarder).

pub mod bridge;
pub mod error;
pub mod state_machine;
pub mod stats;

pub use bridge::Bridge;
pub use error::{BridgeError, Result};
pub use state_machine::{BridgeState, MAX_HISTORY_SIZE, StateMachine, StateTransition};
pub use stats::{BridgeReport, BridgeStats, ExitReason};
