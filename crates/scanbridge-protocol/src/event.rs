use crate::payload::EventPayload;
use scanbridge_core::ReadingId;
use serde::Serialize;
use std::fmt;

/// Classified meaning of one scanner frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A fingerprint matched the template with this id.
    NumericReading { id: ReadingId },

    /// The scanner reported that no template matched.
    NoMatchDiagnostic { raw: String },

    /// Nothing actionable; never forwarded.
    Ignored,
}

impl Event {
    /// Event kind, for logs and counters.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::NumericReading { .. } => EventKind::Numeric,
            Event::NoMatchDiagnostic { .. } => EventKind::NoMatch,
            Event::Ignored => EventKind::Ignored,
        }
    }

    /// Whether the event results in a backend call.
    pub fn is_forwardable(&self) -> bool {
        !matches!(self, Event::Ignored)
    }

    /// JSON body sent to the backend, or `None` for ignored events.
    pub fn payload(&self) -> Option<EventPayload> {
        match self {
            Event::NumericReading { id } => Some(EventPayload::Number {
                number: id.to_string(),
            }),
            Event::NoMatchDiagnostic { raw } => Some(EventPayload::Data { data: raw.clone() }),
            Event::Ignored => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::NumericReading { id } => write!(f, "reading {id}"),
            Event::NoMatchDiagnostic { raw } => write!(f, "no match ({raw})"),
            Event::Ignored => write!(f, "ignored"),
        }
    }
}

/// Event kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Numeric,
    NoMatch,
    Ignored,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Numeric => "numeric",
            EventKind::NoMatch => "no_match",
            EventKind::Ignored => "ignored",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
