//! Line framer for scanner output.
//!
//! This module turns the raw byte stream of the serial port into complete,
//! decoded text lines. Bytes arrive in arbitrary chunks (a single read can
//! hold half a line, several lines, or noise), so the framer buffers
//! incomplete data until a line terminator shows up.
//!
//! # Framing
//!
//! The scanner terminates frames with `\r\n`, but `\n` and a lone `\r` are
//! accepted as well. Each terminator closes the current line:
//!
//! ```text
//! "VOTER: 7\r\nNO_MATCH\n"  →  ["VOTER: 7", "NO_MATCH"]
//! ```
//!
//! # Decoding
//!
//! Decoding never fails. Invalid UTF-8 sequences are dropped and surrounding
//! whitespace is trimmed; every other character, control characters included,
//! is kept as sent. Lines that end up empty are suppressed.
//!
//! A line longer than [`MAX_LINE_LENGTH`] bytes is dropped whole, however the
//! bytes were split across reads.
//!
//! # Usage
//!
//! ```
//! use scanbridge_protocol::LineFramer;
//!
//! let mut framer = LineFramer::new();
//!
//! framer.feed(b"VOTER");
//! assert!(framer.next_line().is_none());
//!
//! framer.feed(b": 42\r\n");
//! assert_eq!(framer.next_line().as_deref(), Some("VOTER: 42"));
//! ```

use bytes::{Buf, BytesMut};
use scanbridge_core::constants::MAX_LINE_LENGTH;
use std::collections::VecDeque;

/// Initial buffer capacity for incoming serial data.
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Recommended initial capacity for the line queue.
const INITIAL_LINE_QUEUE_CAPACITY: usize = 4;

/// Framer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Accumulating bytes of the current line.
    Collecting,

    /// The current line overflowed [`MAX_LINE_LENGTH`]; bytes are dropped
    /// until the next terminator so the tail is not mistaken for a frame.
    Discarding,
}

/// Stateful line framer.
///
/// ```text
/// ┌────────────┐  buffer > MAX_LINE_LENGTH  ┌────────────┐
/// │ Collecting │───────────────────────────>│ Discarding │
/// └────────────┘                            └────────────┘
///       ^  │ terminator: enqueue line             │
///       │  └──────────────┘                       │
///       └─────────────────────────────────────────┘
///                 terminator: drop tail
/// ```
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes of the line being assembled.
    buffer: BytesMut,

    /// Current state.
    state: FramerState,

    /// Decoded lines ready for extraction.
    lines: VecDeque<String>,

    /// Number of overflowing lines dropped so far.
    discarded: u64,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: FramerState::Collecting,
            lines: VecDeque::with_capacity(INITIAL_LINE_QUEUE_CAPACITY),
            discarded: 0,
        }
    }

    /// Feed bytes read from the device.
    ///
    /// Every complete line contained in the buffered data is decoded and
    /// queued; an incomplete tail stays buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        while self.try_extract_line() {}
    }

    /// Next complete line, if any.
    pub fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    /// Number of lines ready for extraction.
    pub fn lines_available(&self) -> usize {
        self.lines.len()
    }

    /// Number of buffered bytes not yet terminated.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Returns current framer state.
    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Number of overflowing lines that were dropped.
    pub fn discarded_lines(&self) -> u64 {
        self.discarded
    }

    /// Discard all buffered bytes and queued lines.
    ///
    /// Used when a device is (re)opened so that no partial frame from a
    /// previous connection leaks into the next one.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.lines.clear();
        self.state = FramerState::Collecting;
    }

    /// Iterator draining all currently queued lines.
    pub fn drain_lines(&mut self) -> DrainLines<'_> {
        DrainLines { framer: self }
    }

    fn try_extract_line(&mut self) -> bool {
        match self.buffer.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(pos) => {
                let line = self.buffer.split_to(pos);
                self.buffer.advance(1);

                match self.state {
                    FramerState::Collecting if line.len() > MAX_LINE_LENGTH => self.discarded += 1,
                    FramerState::Collecting => self.enqueue(&line),
                    FramerState::Discarding => self.state = FramerState::Collecting,
                }
                true
            }
            None => {
                if self.state == FramerState::Discarding {
                    self.buffer.clear();
                } else if self.buffer.len() > MAX_LINE_LENGTH {
                    self.buffer.clear();
                    self.state = FramerState::Discarding;
                    self.discarded += 1;
                }
                false
            }
        }
    }

    fn enqueue(&mut self, raw: &[u8]) {
        let line = decode_lossy(raw);
        if !line.is_empty() {
            self.lines.push_back(line);
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one frame, skipping invalid UTF-8 sequences.
fn decode_lossy(raw: &[u8]) -> String {
    let text: String = raw.utf8_chunks().map(|chunk| chunk.valid()).collect();
    text.trim().to_string()
}

/// Iterator created by [`LineFramer::drain_lines`].
pub struct DrainLines<'a> {
    framer: &'a mut LineFramer,
}

impl<'a> Iterator for DrainLines<'a> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.framer.lines_available();
        (len, Some(len))
    }
}

impl<'a> ExactSizeIterator for DrainLines<'a> {
    fn len(&self) -> usize {
        self.framer.lines_available()
    }
}
