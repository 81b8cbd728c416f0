//! Backend request bodies.
//!
//! Numeric readings are posted as `{"number": "<id>"}` and no-match
//! diagnostics as `{"data": "<raw line>"}`. Ids stay strings so that leading
//! zeros survive the trip.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest payload text rendered by [`EventPayload::summary`].
const SUMMARY_MAX_CHARS: usize = 64;

/// JSON body of one forwarding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Number { number: String },
    Data { data: String },
}

impl EventPayload {
    /// Backend route this payload belongs to.
    pub fn route(&self) -> Route {
        match self {
            EventPayload::Number { .. } => Route::NumericReading,
            EventPayload::Data { .. } => Route::Diagnostics,
        }
    }

    /// Carried text, without the JSON framing.
    pub fn value(&self) -> &str {
        match self {
            EventPayload::Number { number } => number,
            EventPayload::Data { data } => data,
        }
    }

    /// Short rendering for log lines; long diagnostics are cut.
    pub fn summary(&self) -> String {
        let key = match self {
            EventPayload::Number { .. } => "number",
            EventPayload::Data { .. } => "data",
        };
        let value = self.value();
        if value.chars().count() > SUMMARY_MAX_CHARS {
            let cut: String = value.chars().take(SUMMARY_MAX_CHARS).collect();
            format!("{key}={cut}...")
        } else {
            format!("{key}={value}")
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Backend endpoint selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Numeric reading endpoint.
    NumericReading,
    /// Diagnostic data endpoint.
    Diagnostics,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::NumericReading => f.write_str("numeric"),
            Route::Diagnostics => f.write_str("diagnostics"),
        }
    }
}
