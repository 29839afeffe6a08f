//! Client schedule and behavioral preferences

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::timing::{ClockTime, DayFrame};

/// The client's daily rhythm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSchedule {
    /// Wake time, "HH:MM" 24-hour
    pub wake_time: Option<String>,
    /// Sleep time, "HH:MM" 24-hour; may fall after midnight
    pub sleep_time: Option<String>,
    pub work_schedule: Option<String>,
}

impl ClientSchedule {
    pub fn new(wake_time: &str, sleep_time: &str) -> Self {
        Self {
            wake_time: Some(wake_time.to_string()),
            sleep_time: Some(sleep_time.to_string()),
            work_schedule: None,
        }
    }

    /// Validate both times and build the wake-relative frame
    pub fn day_frame(&self) -> PlanResult<DayFrame> {
        let wake = parse_required(self.wake_time.as_deref(), "wake_time")?;
        let sleep = parse_required(self.sleep_time.as_deref(), "sleep_time")?;
        DayFrame::new(wake, sleep).ok_or_else(|| {
            PlanError::input(format!(
                "sleep_time ({}) must differ from wake_time ({})",
                sleep, wake
            ))
        })
    }
}

fn parse_required(value: Option<&str>, field: &str) -> PlanResult<ClockTime> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PlanError::input(format!("{} is required in the client schedule", field)))?;
    ClockTime::parse(raw).ok_or_else(|| {
        PlanError::input(format!(
            "Invalid {} '{}'. Expected HH:MM (24-hour)",
            field, raw
        ))
    })
}

/// Meal-pattern preferences collected during assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralPreferences {
    /// Requested number of meals (1-7)
    #[serde(default)]
    pub explicit_meal_count: Option<u8>,
    /// Fasting pattern written as "fasting:eating" hours, e.g. "16:8"
    #[serde(default)]
    pub fasting_window: Option<String>,
    #[serde(default)]
    pub snack_preference: bool,
    #[serde(default = "default_max_meals")]
    pub max_meals: u8,
}

fn default_max_meals() -> u8 {
    6
}

impl Default for BehavioralPreferences {
    fn default() -> Self {
        Self {
            explicit_meal_count: None,
            fasting_window: None,
            snack_preference: false,
            max_meals: default_max_meals(),
        }
    }
}

impl BehavioralPreferences {
    pub fn validate(&self) -> PlanResult<()> {
        if self.max_meals == 0 {
            return Err(PlanError::input("max_meals must be at least 1"));
        }
        if let Some(count) = self.explicit_meal_count {
            if !(1..=7).contains(&count) {
                return Err(PlanError::input(format!(
                    "explicit_meal_count must be between 1 and 7, got {}",
                    count
                )));
            }
        }
        Ok(())
    }

    /// Eating hours from a "fasting:eating" window, None if the text is malformed
    pub fn eating_hours(&self) -> Option<u32> {
        let window = self.fasting_window.as_deref()?;
        let (fasting, eating) = window.trim().split_once(':')?;
        let fasting: u32 = fasting.trim().parse().ok()?;
        let eating: u32 = eating.trim().parse().ok()?;
        if fasting + eating == 0 || fasting + eating > 24 {
            return None;
        }
        Some(eating)
    }
}
