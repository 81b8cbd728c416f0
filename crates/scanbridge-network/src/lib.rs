//! Outbound HTTP layer for scanbridge.
//!
//! This crate maps classified scanner events to backend requests and sends
//! them. Forwarding is fire-and-forget: one attempt per event, outcome
//! reported, never an error returned to the bridge loop.
//!
//! # Components
//!
//! - **Routes**: event kind to endpoint mapping
//! - **EventForwarder**: the seam the bridge loop forwards through
//! - **HttpForwarder**: `reqwest` implementation of it
//!
//! # Example
//!
//! ```no_run
//! use scanbridge_core::BridgeConfig;
//! use scanbridge_network::{EventForwarder, HttpForwarder};
//! use scanbridge_protocol::classify;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::default().with_backend_url("http://127.0.0.1:3001");
//! let forwarder = HttpForwarder::from_config(&config)?;
//!
//! let outcome = forwarder.forward(&classify("NO_MATCH")).await;
//! assert!(outcome.is_delivered() || outcome.is_failure());
//! # Ok(())
//! # }
//! ```

mod forwarder;
mod routes;

pub use forwarder::{EventForwarder, ForwardError, ForwardOutcome, HttpForwarder};
pub use routes::{OutboundRequest, Routes};
