//! Exchange allocation output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::nutrition::Nutrition;

/// Category id -> exchange count (multiples of 0.5)
pub type ExchangeCounts = BTreeMap<String, f64>;

/// Exchanges chosen for one meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealExchangeAllocation {
    pub meal: String,
    pub energy_weight: f64,
    /// Daily targets scaled by the meal's energy weight
    pub targets: Nutrition,
    pub exchanges: ExchangeCounts,
    /// Nutrition reconstructed from the exchanges
    pub nutrition: Nutrition,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Whole-day allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyExchangeAllocation {
    /// Per-meal allocations in scheduling order
    pub meals: Vec<MealExchangeAllocation>,
    /// Elementwise sum of the per-meal exchanges
    pub daily_exchange_allocation: ExchangeCounts,
    pub daily_nutrition: Nutrition,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl DailyExchangeAllocation {
    pub fn meal(&self, name: &str) -> Option<&MealExchangeAllocation> {
        self.meals.iter().find(|m| m.meal == name)
    }
}
