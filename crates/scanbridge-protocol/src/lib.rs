pub mod classifier;
pub mod event;
pub mod line_framer;
pub mod payload;

pub use classifier::{classify, first_digit_run, is_no_match};
pub use event::{Event, EventKind};
pub use line_framer::{DrainLines, FramerState, LineFramer};
pub use payload::{EventPayload, Route};
