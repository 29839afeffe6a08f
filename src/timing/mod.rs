//! Schedule time arithmetic
//!
//! Clock parsing and wake-relative spans used by the meal timing rules.

pub mod clock;
pub mod window;

pub use clock::{hours_to_minutes, ClockTime, DayFrame, Offset, MINUTES_PER_DAY};
pub use window::{clock_interval_spans, Span};
