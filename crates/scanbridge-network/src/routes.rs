//! Event to endpoint routing.

use crate::forwarder::ForwardError;
use scanbridge_core::BridgeConfig;
use scanbridge_protocol::{Event, EventPayload, Route};
use std::fmt;
use url::Url;

/// The two fixed backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    numeric: Url,
    diagnostics: Url,
}

impl Routes {
    /// Parse both endpoint URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::InvalidEndpoint`] if either URL does not parse.
    pub fn new(numeric: &str, diagnostics: &str) -> Result<Self, ForwardError> {
        Ok(Self {
            numeric: parse_endpoint(numeric)?,
            diagnostics: parse_endpoint(diagnostics)?,
        })
    }

    /// Endpoints configured in `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, ForwardError> {
        Self::new(&config.numeric_endpoint, &config.diagnostics_endpoint)
    }

    /// Endpoint serving `route`.
    pub fn endpoint(&self, route: Route) -> &Url {
        match route {
            Route::NumericReading => &self.numeric,
            Route::Diagnostics => &self.diagnostics,
        }
    }

    /// Request to send for `event`; `None` when the event is not forwarded.
    pub fn route(&self, event: &Event) -> Option<OutboundRequest> {
        let payload = event.payload()?;
        Some(OutboundRequest {
            endpoint: self.endpoint(payload.route()).clone(),
            payload,
        })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ForwardError> {
    Url::parse(endpoint).map_err(|e| ForwardError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// One forwarding attempt: where it goes and what it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub endpoint: Url,
    pub payload: EventPayload,
}

impl OutboundRequest {
    /// Short rendering for log lines.
    pub fn summary(&self) -> String {
        self.payload.summary()
    }
}

impl fmt::Display for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POST {} {}", self.endpoint, self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scanbridge_protocol::classify;

    fn routes() -> Routes {
        Routes::from_config(&BridgeConfig::default()).unwrap()
    }

    #[rstest]
    #[case("VOTER: 123", "http://localhost:3001/api/arduino/number", r#"{"number":"123"}"#)]
    #[case("NO_MATCH", "http://localhost:3001/api/arduino/data", r#"{"data":"NO_MATCH"}"#)]
    fn test_route_by_event(#[case] line: &str, #[case] endpoint: &str, #[case] body: &str) {
        let request = routes().route(&classify(line)).unwrap();

        assert_eq!(request.endpoint.as_str(), endpoint);
        assert_eq!(request.payload.to_json().unwrap(), body);
    }

    #[test]
    fn test_ignored_is_not_routed() {
        assert!(routes().route(&Event::Ignored).is_none());
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = Routes::new("not a url", "http://localhost/data").unwrap_err();
        assert!(matches!(err, ForwardError::InvalidEndpoint { .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_display() {
        let request = routes().route(&classify("VOTER: 7")).unwrap();
        assert_eq!(
            request.to_string(),
            "POST http://localhost:3001/api/arduino/number number=7"
        );
    }
}
