use crate::{Result, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fingerprint template id reported by the scanner.
///
/// Always a non-empty run of ASCII decimal digits. Leading zeros are
/// significant (`"007"` and `"7"` are different ids) so the value is kept
/// as text rather than parsed into an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReadingId(String);

impl ReadingId {
    /// Create a new reading id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidReading` if the id is empty or contains
    /// anything other than ASCII digits.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidReading("reading id is empty".to_string()));
        }
        if !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidReading(format!(
                "reading id must be decimal digits, got {id:?}"
            )));
        }
        Ok(ReadingId(id))
    }

    /// Get the reading id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReadingId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ReadingId::new(s)
    }
}

impl TryFrom<String> for ReadingId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        ReadingId::new(value)
    }
}

impl From<ReadingId> for String {
    fn from(id: ReadingId) -> Self {
        id.0
    }
}

/// One decoded, trimmed, non-empty text frame from the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    text: String,
    received_at: DateTime<Utc>,
}

impl RawLine {
    /// Wrap a decoded frame, stamping it with the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// Frame text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the frame was assembled.
    #[must_use]
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Consume the line, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
