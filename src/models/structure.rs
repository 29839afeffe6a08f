//! Meal structure output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timing::{ClockTime, DayFrame, Span};

/// Eating window for one meal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealWindow {
    pub start: ClockTime,
    pub end: ClockTime,
    /// Minutes after wake time at which the window opens
    pub start_offset_minutes: i32,
    /// Minutes after wake time at which the window closes
    pub end_offset_minutes: i32,
}

impl MealWindow {
    pub fn from_span(frame: &DayFrame, span: Span) -> Self {
        Self {
            start: frame.clock_at(span.start),
            end: frame.clock_at(span.end),
            start_offset_minutes: span.start,
            end_offset_minutes: span.end,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_offset_minutes, self.end_offset_minutes)
    }
}

/// Daily meal skeleton: which meals, when, and what share of the day's energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealStructure {
    pub meal_count: usize,
    /// Meal identifiers in scheduling order
    pub meals: Vec<String>,
    pub timing_windows: BTreeMap<String, MealWindow>,
    pub energy_weight: BTreeMap<String, f64>,
    /// Adjustments and warnings raised while building the structure
    #[serde(default)]
    pub flags: Vec<String>,
}

impl MealStructure {
    pub fn weight_sum(&self) -> f64 {
        self.energy_weight.values().sum()
    }

    pub fn weight_of(&self, meal: &str) -> f64 {
        self.energy_weight.get(meal).copied().unwrap_or(0.0)
    }

    pub fn window_of(&self, meal: &str) -> Option<&MealWindow> {
        self.timing_windows.get(meal)
    }
}
