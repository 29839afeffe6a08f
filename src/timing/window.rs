//! Wake-relative time spans

use super::clock::{ClockTime, DayFrame, Offset, MINUTES_PER_DAY};

/// A half-open interval `[start, end)` in minutes since wake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Offset,
    pub end: Offset,
}

impl Span {
    pub fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    pub fn ending_at(end: Offset, duration: i32) -> Self {
        Self {
            start: end - duration,
            end,
        }
    }

    pub fn starting_at(start: Offset, duration: i32) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    pub fn duration(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Touching endpoints do not count as an overlap
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn shifted(&self, minutes: i32) -> Self {
        Self {
            start: self.start + minutes,
            end: self.end + minutes,
        }
    }

    /// Shorten the span so it ends no later than `latest_end`.
    ///
    /// Returns None if nothing of the span is left.
    pub fn clipped_to(&self, latest_end: Offset) -> Option<Self> {
        if self.end <= latest_end {
            return Some(*self);
        }
        if self.start < latest_end {
            return Some(Self {
                start: self.start,
                end: latest_end,
            });
        }
        None
    }
}

/// Project a wall-clock interval (which may wrap midnight, e.g. 22:00-02:00) onto
/// wake-relative offsets.
///
/// The interval is returned twice, one day apart, so a window near either end of the
/// waking day is tested against the right occurrence.
pub fn clock_interval_spans(frame: &DayFrame, start: ClockTime, end: ClockTime) -> [Span; 2] {
    let begin = frame.offset_of(start);
    let length = (end.minute_of_day() - start.minute_of_day()).rem_euclid(MINUTES_PER_DAY);
    let span = Span::starting_at(begin, length);
    [span, span.shifted(-MINUTES_PER_DAY)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Span::new(0, 60);
        let b = Span::new(60, 120);
        let c = Span::new(30, 90);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_clipped_to() {
        let span = Span::new(600, 720);
        assert_eq!(span.clipped_to(800), Some(span));
        assert_eq!(span.clipped_to(660), Some(Span::new(600, 660)));
        assert_eq!(span.clipped_to(600), None);
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Span::ending_at(720, 90), Span::new(630, 720));
        assert_eq!(Span::starting_at(300, 60).duration(), 60);
        assert!(Span::new(10, 10).is_empty());
    }

    #[test]
    fn test_clock_interval_wrapping_midnight() {
        let frame = DayFrame::new(t("07:00"), t("23:30")).unwrap();
        let [today, earlier] = clock_interval_spans(&frame, t("22:00"), t("02:00"));
        assert_eq!(today, Span::new(15 * 60, 19 * 60));
        assert_eq!(earlier, Span::new(15 * 60 - 1440, 19 * 60 - 1440));
    }

    #[test]
    fn test_clock_interval_before_wake_falls_on_next_day() {
        // 10:00-14:00 seen from a 14:00 wake starts 20 hours later
        let frame = DayFrame::new(t("14:00"), t("02:00")).unwrap();
        let [next, previous] = clock_interval_spans(&frame, t("10:00"), t("14:00"));
        assert_eq!(next, Span::new(20 * 60, 24 * 60));
        assert_eq!(previous, Span::new(-4 * 60, 0));
    }
}
