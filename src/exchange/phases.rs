//! The three allocation phases: Floor, Protein-Fill, Calorie-Fill
//!
//! Each phase takes the previous state by value and returns the next one.

use serde::Serialize;
use tracing::debug;

use super::state::{covering_halves, AllocationState};
use super::strategy::WeightedAllocation;
use crate::models::Nutrition;
use crate::rules::ExchangeCategory;

/// Knobs that gate the fill phases
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationPolicy {
    /// Grams of protein per kcal at or above which a category counts as protein-rich
    pub protein_density_threshold: f64,
    /// How many protein-rich categories share the protein need
    pub protein_candidates: usize,
    pub calorie_tolerance: f64,
    pub protein_tolerance: f64,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            protein_density_threshold: 0.05,
            protein_candidates: 3,
            calorie_tolerance: 10.0,
            protein_tolerance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryClass {
    ProteinRich,
    CalorieRich,
    /// No calories: floored when mandatory but never used to fill
    Inert,
}

impl CategoryClass {
    pub fn of(category: &ExchangeCategory, policy: &AllocationPolicy) -> Self {
        match category.nutrition_per_exchange.protein_density() {
            None => CategoryClass::Inert,
            Some(density) if density >= policy.protein_density_threshold => {
                CategoryClass::ProteinRich
            }
            Some(_) => CategoryClass::CalorieRich,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryClass::ProteinRich => "protein_rich",
            CategoryClass::CalorieRich => "calorie_rich",
            CategoryClass::Inert => "inert",
        }
    }
}

fn of_class<'a>(
    state: &AllocationState<'a>,
    class: CategoryClass,
    policy: &AllocationPolicy,
) -> Vec<&'a ExchangeCategory> {
    state
        .categories()
        .filter(|c| CategoryClass::of(c, policy) == class)
        .collect()
}

/// Phase 1: every mandatory category starts at half an exchange
pub fn floor<'a>(categories: &[&'a ExchangeCategory]) -> AllocationState<'a> {
    AllocationState::with_floor(categories, 1)
}

/// Phase 2: cover the protein still missing after the floor, using protein-rich
/// categories only
pub fn fill_protein<'a>(
    state: AllocationState<'a>,
    target: &Nutrition,
    policy: &AllocationPolicy,
) -> AllocationState<'a> {
    let need = target.protein_g - state.nutrition().protein_g;
    if need <= policy.protein_tolerance {
        return state;
    }
    let sources = of_class(&state, CategoryClass::ProteinRich, policy);
    match WeightedAllocation::protein(
        &sources,
        need,
        policy.protein_candidates,
        policy.protein_tolerance,
    ) {
        Some(plan) => {
            debug!("Protein fill: {:.1} g across {} sources", need, plan.candidates.len());
            plan.apply(state)
        }
        None => state,
    }
}

/// Phase 3: cover the remaining calories, calorie-rich categories first (most kcal per
/// exchange first), then protein-rich ones in the same order
pub fn fill_calories<'a>(
    state: AllocationState<'a>,
    target: &Nutrition,
    policy: &AllocationPolicy,
) -> AllocationState<'a> {
    let mut remaining = target.calories - state.nutrition().calories;
    if remaining <= policy.calorie_tolerance {
        return state;
    }

    let by_calories = |mut list: Vec<&'a ExchangeCategory>| {
        list.sort_by(|a, b| {
            b.nutrition_per_exchange
                .calories
                .total_cmp(&a.nutrition_per_exchange.calories)
        });
        list
    };
    let order: Vec<&'a ExchangeCategory> = by_calories(of_class(&state, CategoryClass::CalorieRich, policy))
        .into_iter()
        .chain(by_calories(of_class(&state, CategoryClass::ProteinRich, policy)))
        .collect();

    let mut state = state;
    for category in order {
        if remaining <= policy.calorie_tolerance {
            break;
        }
        let kcal = category.nutrition_per_exchange.calories;
        let halves = covering_halves(remaining, kcal, policy.calorie_tolerance).max(1);
        remaining -= halves as f64 / 2.0 * kcal;
        state = state.with_added(category.id(), halves);
        debug!("Calorie fill: +{} x {}", halves as f64 / 2.0, category.id());
    }
    state
}
