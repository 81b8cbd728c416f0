//! Frame classification.
//!
//! [`classify`] maps one decoded scanner line to an [`Event`]:
//!
//! 1. a line containing `NO_MATCH` (any case) is a [`Event::NoMatchDiagnostic`],
//!    whatever digits it also carries;
//! 2. otherwise the first maximal run of ASCII digits becomes the id of a
//!    [`Event::NumericReading`];
//! 3. anything else is [`Event::Ignored`].
//!
//! There is no semantic validation beyond "looks numeric": a boot banner such
//! as `"Sensor v2 ready"` classifies as reading `2`. That heuristic matches
//! what the scanner firmware emits and is kept on purpose.

use crate::event::Event;
use regex::Regex;
use scanbridge_core::ReadingId;
use scanbridge_core::constants::NO_MATCH_TOKEN;
use std::sync::LazyLock;

/// Maximal runs of ASCII decimal digits.
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit run pattern is valid"));

/// Classify one scanner line. Pure, never fails.
///
/// # Examples
///
/// ```
/// use scanbridge_protocol::{Event, classify};
///
/// assert!(matches!(classify("VOTER: 007 finger2"), Event::NumericReading { id } if id.as_str() == "007"));
/// assert!(matches!(classify("no_match 42"), Event::NoMatchDiagnostic { .. }));
/// assert_eq!(classify("hello world"), Event::Ignored);
/// ```
pub fn classify(line: &str) -> Event {
    if is_no_match(line) {
        return Event::NoMatchDiagnostic {
            raw: line.to_string(),
        };
    }

    match first_digit_run(line).map(ReadingId::new) {
        Some(Ok(id)) => Event::NumericReading { id },
        // A digit run is always a valid id; treat the impossible case as noise
        Some(Err(_)) | None => Event::Ignored,
    }
}

/// Whether the line carries the no-match token, compared case-insensitively.
pub fn is_no_match(line: &str) -> bool {
    line.to_uppercase().contains(NO_MATCH_TOKEN)
}

/// First maximal run of ASCII digits, scanning left to right.
pub fn first_digit_run(line: &str) -> Option<&str> {
    DIGIT_RUN.find(line).map(|m| m.as_str())
}
