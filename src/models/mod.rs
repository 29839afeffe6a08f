//! Data models
//!
//! Inputs to and outputs from the planning engines.

mod advisory;
mod context;
mod exchange;
mod meal;
mod nutrition;
mod schedule;
mod structure;
mod targets;

pub use advisory::TimingAdvisory;
pub use context::{AllocationContext, WEIGHT_LOSS_GOAL};
pub use exchange::{DailyExchangeAllocation, ExchangeCounts, MealExchangeAllocation};
pub use meal::{MealKind, MealSlot};
pub use nutrition::{round_to, Nutrition};
pub use schedule::{BehavioralPreferences, ClientSchedule};
pub use structure::{MealStructure, MealWindow};
pub use targets::NutritionTargets;
