//! Exchange allocation engine

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::phases::{fill_calories, fill_protein, floor, AllocationPolicy};
use crate::error::{PlanError, PlanResult};
use crate::models::{
    round_to, DailyExchangeAllocation, ExchangeCounts, MealExchangeAllocation, MealStructure,
    Nutrition, NutritionTargets,
};
use crate::rules::{ExchangeCategory, RuleTables};

/// Mandatory category ids per meal name
pub type MandatoryCategories = BTreeMap<String, Vec<String>>;

/// Turns a meal structure and daily targets into exchange counts
#[derive(Debug, Clone, Copy)]
pub struct ExchangeEngine<'a> {
    tables: &'a RuleTables,
    policy: AllocationPolicy,
}

impl<'a> ExchangeEngine<'a> {
    pub fn new(tables: &'a RuleTables) -> Self {
        Self::with_policy(tables, AllocationPolicy::default())
    }

    pub fn with_policy(tables: &'a RuleTables, policy: AllocationPolicy) -> Self {
        Self { tables, policy }
    }

    /// Look up each mandatory category once, keeping first-seen order
    fn resolve(&self, mandatory: &[String]) -> PlanResult<Vec<&'a ExchangeCategory>> {
        let mut resolved: Vec<&'a ExchangeCategory> = Vec::new();
        for id in mandatory {
            let id = id.trim();
            if resolved.iter().any(|c| c.id() == id) {
                continue;
            }
            let category = self.tables.exchange_category(id).ok_or_else(|| {
                PlanError::input(format!("Unknown exchange category '{}'", id))
            })?;
            resolved.push(category);
        }
        Ok(resolved)
    }

    /// Allocate one meal: Floor, then Protein-Fill, then Calorie-Fill
    pub fn allocate_meal(
        &self,
        meal: &str,
        energy_weight: f64,
        targets: &NutritionTargets,
        mandatory: &[String],
    ) -> PlanResult<MealExchangeAllocation> {
        let meal_targets = targets.for_meal(energy_weight);
        let categories = self.resolve(mandatory)?;
        let mut flags = Vec::new();

        if categories.is_empty() {
            debug!("{} has no mandatory categories; leaving it empty", meal);
            return Ok(MealExchangeAllocation {
                meal: meal.to_string(),
                energy_weight,
                targets: meal_targets,
                exchanges: ExchangeCounts::new(),
                nutrition: Nutrition::zero(),
                flags,
            });
        }

        let state = floor(&categories);
        let state = fill_protein(state, &meal_targets, &self.policy);
        let state = fill_calories(state, &meal_targets, &self.policy);
        let nutrition = state.nutrition();

        let protein_short = meal_targets.protein_g - nutrition.protein_g;
        if protein_short > self.policy.protein_tolerance {
            warn!("{} is {:.1} g short of protein", meal, protein_short);
            flags.push(format!("protein_shortfall_{}_{:.1}g", meal, protein_short));
        }
        let calories_short = meal_targets.calories - nutrition.calories;
        if calories_short > self.policy.calorie_tolerance {
            warn!("{} is {:.0} kcal short", meal, calories_short);
            flags.push(format!("calorie_shortfall_{}_{:.0}kcal", meal, calories_short));
        }

        Ok(MealExchangeAllocation {
            meal: meal.to_string(),
            energy_weight,
            targets: meal_targets,
            exchanges: state.to_counts(),
            nutrition: nutrition.rounded(),
            flags,
        })
    }

    /// Allocate every meal of a structure in scheduling order and sum the day
    pub fn allocate(
        &self,
        structure: &MealStructure,
        targets: &NutritionTargets,
        mandatory: &MandatoryCategories,
    ) -> PlanResult<DailyExchangeAllocation> {
        targets.validate()?;
        let mut flags = Vec::new();
        for meal in mandatory.keys() {
            if !structure.meals.contains(meal) {
                warn!("Mandatory categories given for unscheduled meal '{}'", meal);
                flags.push(format!("mandatory_categories_ignored_for_{}", meal));
            }
        }

        let meals = structure
            .meals
            .iter()
            .map(|meal| {
                let list = mandatory.get(meal).map(Vec::as_slice).unwrap_or(&[]);
                self.allocate_meal(meal, structure.weight_of(meal), targets, list)
            })
            .collect::<PlanResult<Vec<_>>>()?;

        let mut daily = ExchangeCounts::new();
        for allocation in &meals {
            for (category, count) in &allocation.exchanges {
                *daily.entry(category.clone()).or_insert(0.0) += count;
            }
            flags.extend(allocation.flags.iter().cloned());
        }
        for count in daily.values_mut() {
            *count = round_to(*count, 2);
        }
        let daily_nutrition = meals
            .iter()
            .map(|m| m.nutrition)
            .sum::<Nutrition>()
            .rounded();

        info!(
            "Exchange allocation: {} meals, {} categories, {} kcal",
            meals.len(),
            daily.len(),
            daily_nutrition.calories
        );
        Ok(DailyExchangeAllocation {
            meals,
            daily_exchange_allocation: daily,
            daily_nutrition,
            flags,
        })
    }
}
