//! HTTP forwarder for classified scanner events.
//!
//! Each forwardable event becomes exactly one `POST` with a JSON body:
//!
//! ```text
//! NumericReading{id}        ──> POST <numeric endpoint>      {"number": "<id>"}
//! NoMatchDiagnostic{raw}    ──> POST <diagnostics endpoint>  {"data": "<raw>"}
//! Ignored                   ──> (nothing)
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed request is logged and the event is lost
//! - **No queueing**: nothing is buffered while the backend is down
//! - **Never fails the caller**: every request ends in a [`ForwardOutcome`]
//!
//! Only HTTP 200 counts as delivered; any other status is a rejection.

#![allow(async_fn_in_trait)]

use crate::routes::{OutboundRequest, Routes};
use scanbridge_core::constants::SUCCESS_STATUS;
use scanbridge_core::{BridgeConfig, Error as CoreError};
use scanbridge_protocol::Event;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors raised while setting up a forwarder.
///
/// Per-request failures are not errors; they are reported as
/// [`ForwardOutcome::Rejected`] or [`ForwardOutcome::TransportFailed`].
#[derive(Debug, Error)]
pub enum ForwardError {
    /// An endpoint URL could not be parsed
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<ForwardError> for CoreError {
    fn from(error: ForwardError) -> Self {
        match error {
            ForwardError::InvalidEndpoint { .. } => CoreError::config(error.to_string()),
            ForwardError::Client(e) => CoreError::internal(e.to_string()),
        }
    }
}

/// Result of one forwarding attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The backend answered 200.
    Delivered { status: u16 },

    /// The backend answered with another status.
    Rejected { status: u16 },

    /// No HTTP response: refused, timed out, DNS failure.
    TransportFailed { error: String },

    /// The event is not forwarded.
    Skipped,
}

impl ForwardOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::TransportFailed { .. })
    }
}

impl fmt::Display for ForwardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered { status } => write!(f, "delivered ({status})"),
            Self::Rejected { status } => write!(f, "rejected ({status})"),
            Self::TransportFailed { error } => write!(f, "transport failure: {error}"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Sink for classified events.
///
/// Implementations must never fail the caller: whatever happens to the
/// request is folded into the returned [`ForwardOutcome`].
pub trait EventForwarder: Send + Sync {
    async fn forward(&self, event: &Event) -> ForwardOutcome;
}

/// Forwarder posting events to the backend over HTTP.
///
/// # Example
///
/// ```no_run
/// use scanbridge_core::BridgeConfig;
/// use scanbridge_network::{EventForwarder, HttpForwarder};
/// use scanbridge_protocol::classify;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let forwarder = HttpForwarder::from_config(&BridgeConfig::default())?;
/// let outcome = forwarder.forward(&classify("VOTER: 42")).await;
/// println!("{outcome}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    routes: Routes,
}

impl HttpForwarder {
    /// Create a forwarder with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(
        routes: Routes,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("scanbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(
            numeric = %routes.endpoint(scanbridge_protocol::Route::NumericReading),
            diagnostics = %routes.endpoint(scanbridge_protocol::Route::Diagnostics),
            timeout_ms = request_timeout.as_millis() as u64,
            "HTTP forwarder ready"
        );

        Ok(Self { client, routes })
    }

    /// Create a forwarder from the bridge configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is not a valid URL or the HTTP client
    /// cannot be initialized.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, ForwardError> {
        Self::new(
            Routes::from_config(config)?,
            config.request_timeout,
            config.connect_timeout,
        )
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    async fn send(&self, request: &OutboundRequest) -> ForwardOutcome {
        let response = self
            .client
            .post(request.endpoint.clone())
            .json(&request.payload)
            .send()
            .await;

        match response {
            Ok(response) if response.status().as_u16() == SUCCESS_STATUS => {
                let status = response.status().as_u16();
                debug!(endpoint = %request.endpoint, payload = %request.summary(), status, "Event delivered");
                ForwardOutcome::Delivered { status }
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let error = CoreError::forwarding(request.endpoint.as_str(), format!("HTTP {status}"));
                warn!(payload = %request.summary(), status, %error, "Backend rejected event");
                ForwardOutcome::Rejected { status }
            }
            Err(e) => {
                let error = CoreError::forwarding(request.endpoint.as_str(), e.to_string());
                warn!(payload = %request.summary(), timeout = e.is_timeout(), %error, "Backend unreachable");
                ForwardOutcome::TransportFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}

impl EventForwarder for HttpForwarder {
    async fn forward(&self, event: &Event) -> ForwardOutcome {
        match self.routes.route(event) {
            Some(request) => self.send(&request).await,
            None => {
                trace!(kind = %event.kind(), "Event not forwarded");
                ForwardOutcome::Skipped
            }
        }
    }
}
