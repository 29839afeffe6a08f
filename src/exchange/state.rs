//! Allocation state for one meal
//!
//! Counts are held as whole half-exchanges, so every count is a multiple of 0.5.

use crate::models::{round_to, ExchangeCounts, Nutrition};
use crate::rules::ExchangeCategory;

/// Exchanges chosen so far, in mandatory-list order
#[derive(Debug, Clone)]
pub struct AllocationState<'a> {
    entries: Vec<(&'a ExchangeCategory, u32)>,
}

impl<'a> AllocationState<'a> {
    /// Every category at `halves` half-exchanges
    pub fn with_floor(categories: &[&'a ExchangeCategory], halves: u32) -> Self {
        Self {
            entries: categories.iter().map(|c| (*c, halves)).collect(),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &'a ExchangeCategory> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    pub fn halves(&self, id: &str) -> u32 {
        self.entries
            .iter()
            .find(|(c, _)| c.id() == id)
            .map(|(_, h)| *h)
            .unwrap_or(0)
    }

    pub fn count(&self, id: &str) -> f64 {
        self.halves(id) as f64 / 2.0
    }

    /// New state with `halves` more half-exchanges of `id`
    pub fn with_added(mut self, id: &str, halves: u32) -> Self {
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| c.id() == id) {
            entry.1 += halves;
        }
        self
    }

    /// Nutrition of everything allocated so far
    pub fn nutrition(&self) -> Nutrition {
        self.entries
            .iter()
            .map(|(c, h)| c.nutrition_per_exchange * (*h as f64 / 2.0))
            .sum()
    }

    /// Non-zero counts rounded to two decimals
    pub fn to_counts(&self) -> ExchangeCounts {
        self.entries
            .iter()
            .filter(|(_, h)| *h > 0)
            .map(|(c, h)| (c.id().to_string(), round_to(*h as f64 / 2.0, 2)))
            .collect()
    }
}

/// Half-exchanges closest to `units` exchanges
pub fn nearest_halves(units: f64) -> u32 {
    if units.is_finite() && units > 0.0 {
        (units * 2.0).round() as u32
    } else {
        0
    }
}

/// Half-exchanges needed to cover `need` at `per_exchange` each.
///
/// Rounds to the nearest half; if that would leave more than `tolerance` uncovered it
/// rounds up instead, so the result overshoots rather than falls short.
pub fn covering_halves(need: f64, per_exchange: f64, tolerance: f64) -> u32 {
    if per_exchange <= 0.0 || need <= 0.0 {
        return 0;
    }
    let units = need / per_exchange;
    let nearest = nearest_halves(units);
    if need - nearest as f64 / 2.0 * per_exchange > tolerance {
        (units * 2.0).ceil() as u32
    } else {
        nearest
    }
}
