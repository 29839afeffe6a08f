//! Wall-clock parsing and wake-relative offsets
//!
//! Every schedule computation works in minutes since the client's wake time. A meal
//! after midnight simply has an offset larger than the minutes left in the wake day,
//! so no comparison ever depends on which side of midnight a clock reading falls.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Minutes elapsed since wake time
pub type Offset = i32;

/// Convert fractional hours from a rule table to whole minutes
pub fn hours_to_minutes(hours: f64) -> i32 {
    (hours * 60.0).round() as i32
}

/// A wall-clock reading with minute precision, serialized as "HH:MM"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minute_of_day: i32,
}

impl ClockTime {
    /// Parse a 24-hour "HH:MM" string
    ///
    /// Examples:
    /// - "07:00" -> 07:00
    /// - "23:45" -> 23:45
    /// - "24:00" -> None
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.len() < 4 || trimmed.len() > 5 {
            return None;
        }
        let time = NaiveTime::parse_from_str(trimmed, "%H:%M").ok()?;
        Some(Self {
            minute_of_day: (time.hour() * 60 + time.minute()) as i32,
        })
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            minute_of_day: (hour * 60 + minute) as i32,
        })
    }

    /// Wrap an arbitrary minute count onto the 24-hour dial
    pub fn from_minutes_wrapping(minutes: i32) -> Self {
        Self {
            minute_of_day: minutes.rem_euclid(MINUTES_PER_DAY),
        }
    }

    pub fn minute_of_day(&self) -> i32 {
        self.minute_of_day
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minute_of_day / 60, self.minute_of_day % 60)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&value)
            .ok_or_else(|| format!("invalid time '{}', expected HH:MM (24-hour)", value))
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// The waking day of one client: wake time plus the offset at which they sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayFrame {
    wake: ClockTime,
    sleep_offset: Offset,
}

impl DayFrame {
    /// Build a frame where sleep follows wake, wrapping past midnight if needed.
    ///
    /// Returns None when wake and sleep are the same minute.
    pub fn new(wake: ClockTime, sleep: ClockTime) -> Option<Self> {
        let sleep_offset = (sleep.minute_of_day - wake.minute_of_day).rem_euclid(MINUTES_PER_DAY);
        if sleep_offset == 0 {
            return None;
        }
        Some(Self { wake, sleep_offset })
    }

    pub fn wake(&self) -> ClockTime {
        self.wake
    }

    pub fn sleep(&self) -> ClockTime {
        self.clock_at(self.sleep_offset)
    }

    pub fn sleep_offset(&self) -> Offset {
        self.sleep_offset
    }

    /// Wall-clock reading at a wake-relative offset
    pub fn clock_at(&self, offset: Offset) -> ClockTime {
        ClockTime::from_minutes_wrapping(self.wake.minute_of_day + offset)
    }

    /// Offset of the next occurrence of a wall-clock reading at or after wake
    pub fn offset_of(&self, clock: ClockTime) -> Offset {
        (clock.minute_of_day - self.wake.minute_of_day).rem_euclid(MINUTES_PER_DAY)
    }

    /// Latest permitted end for a window that must finish `buffer_minutes` before sleep
    pub fn latest_end(&self, buffer_minutes: i32) -> Offset {
        self.sleep_offset - buffer_minutes
    }

    /// Hours between an offset and sleep time (negative once past sleep)
    pub fn hours_before_sleep(&self, offset: Offset) -> f64 {
        (self.sleep_offset - offset) as f64 / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(t("07:00").minute_of_day(), 420);
        assert_eq!(t("23:59").minute_of_day(), 1439);
        assert_eq!(t("00:00").minute_of_day(), 0);
        assert!(ClockTime::parse("24:00").is_none());
        assert!(ClockTime::parse("7am").is_none());
        assert!(ClockTime::parse("12:60").is_none());
        assert!(ClockTime::parse("").is_none());
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(t("07:05").to_string(), "07:05");
        assert_eq!(ClockTime::from_minutes_wrapping(-30).to_string(), "23:30");
        assert_eq!(ClockTime::from_minutes_wrapping(1500).to_string(), "01:00");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&t("18:30")).unwrap();
        assert_eq!(json, "\"18:30\"");
        let back: ClockTime = serde_json::from_str("\"06:15\"").unwrap();
        assert_eq!(back, t("06:15"));
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn test_day_frame_same_day() {
        let frame = DayFrame::new(t("07:00"), t("22:00")).unwrap();
        assert_eq!(frame.sleep_offset(), 15 * 60);
        assert_eq!(frame.clock_at(90).to_string(), "08:30");
        assert_eq!(frame.offset_of(t("12:00")), 300);
    }

    #[test]
    fn test_day_frame_wraps_midnight() {
        // Night shift: up at 14:00, asleep at 02:00
        let frame = DayFrame::new(t("14:00"), t("02:00")).unwrap();
        assert_eq!(frame.sleep_offset(), 12 * 60);
        assert_eq!(frame.sleep().to_string(), "02:00");
        assert_eq!(frame.latest_end(180), 9 * 60);
        assert_eq!(frame.clock_at(frame.latest_end(180)).to_string(), "23:00");
        // 01:00 is after midnight but still before sleep
        assert_eq!(frame.offset_of(t("01:00")), 11 * 60);
    }

    #[test]
    fn test_day_frame_rejects_zero_length_day() {
        assert!(DayFrame::new(t("07:00"), t("07:00")).is_none());
    }

    #[test]
    fn test_hours_to_minutes() {
        assert_eq!(hours_to_minutes(1.5), 90);
        assert_eq!(hours_to_minutes(0.25), 15);
        assert_eq!(hours_to_minutes(-3.0), -180);
    }
}
