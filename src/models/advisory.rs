//! Advisory timing nudges from the wellness-advisory layer

use serde::{Deserialize, Serialize};

use super::meal::MealKind;
use crate::timing::ClockTime;

/// An optional, secondary adjustment to meal windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimingAdvisory {
    /// Dinner and snacks should be finished by this time
    AvoidAfter { not_after: ClockTime },
    /// No meal except lunch should fall inside this interval; may wrap midnight
    AvoidInterval { start: ClockTime, end: ClockTime },
}

impl TimingAdvisory {
    pub fn applies_to(&self, kind: MealKind) -> bool {
        match self {
            TimingAdvisory::AvoidAfter { .. } => {
                matches!(kind, MealKind::Dinner | MealKind::Snack)
            }
            TimingAdvisory::AvoidInterval { .. } => kind != MealKind::Lunch,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TimingAdvisory::AvoidAfter { not_after } => format!("avoid_after_{}", not_after),
            TimingAdvisory::AvoidInterval { start, end } => {
                format!("avoid_{}_{}", start, end)
            }
        }
    }
}
