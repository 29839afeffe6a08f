//! Rule table accessor
//!
//! Externally authored JSON tables, loaded once and validated into typed lookups.
//! Tables are never mutated after load; the server shares them behind an `Arc`.

mod selection;
mod tables;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

pub use selection::select_rule;
pub use tables::{
    CalorieAllocationRule, CalorieRange, ExchangeCategory, FastingWindowRule, MealCountRules,
    MealPercentages, RedistributionRatios, RedistributionRules, RedistributionScenario,
    SnackPolicy, TimingFormula, TimingRuleRecord, TimingRules, ValidationThresholds,
};

use crate::error::{PlanError, PlanResult};
use crate::models::{AllocationContext, MealKind, TimingAdvisory};

pub const MEAL_COUNT_FILE: &str = "meal_count_rules.json";
pub const MEAL_TIMING_FILE: &str = "meal_timing_rules.json";
pub const CALORIE_ALLOCATION_FILE: &str = "calorie_allocation_rules.json";
pub const EXCHANGE_CATEGORIES_FILE: &str = "exchange_categories.json";
pub const THRESHOLDS_FILE: &str = "validation_thresholds.json";
pub const ADVISORIES_FILE: &str = "timing_advisories.json";

/// Raw JSON text of every table, before parsing
#[derive(Debug, Clone)]
pub struct RuleSources {
    pub meal_count: String,
    pub meal_timing: String,
    pub calorie_allocation: String,
    pub exchange_categories: String,
    pub thresholds: String,
    /// Optional; no dosha advisories are known without it
    pub advisories: Option<String>,
}

impl RuleSources {
    /// Snapshot compiled into the binary
    pub fn builtin() -> Self {
        Self {
            meal_count: include_str!("../../data/rules/meal_count_rules.json").to_string(),
            meal_timing: include_str!("../../data/rules/meal_timing_rules.json").to_string(),
            calorie_allocation: include_str!("../../data/rules/calorie_allocation_rules.json")
                .to_string(),
            exchange_categories: include_str!("../../data/rules/exchange_categories.json")
                .to_string(),
            thresholds: include_str!("../../data/rules/validation_thresholds.json").to_string(),
            advisories: Some(include_str!("../../data/rules/timing_advisories.json").to_string()),
        }
    }

    pub fn read_dir(dir: &Path) -> PlanResult<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|source| PlanError::RuleTableRead { path, source })
        };
        let advisories_path = dir.join(ADVISORIES_FILE);
        let advisories = if advisories_path.exists() {
            Some(read(ADVISORIES_FILE)?)
        } else {
            None
        };
        Ok(Self {
            meal_count: read(MEAL_COUNT_FILE)?,
            meal_timing: read(MEAL_TIMING_FILE)?,
            calorie_allocation: read(CALORIE_ALLOCATION_FILE)?,
            exchange_categories: read(EXCHANGE_CATEGORIES_FILE)?,
            thresholds: read(THRESHOLDS_FILE)?,
            advisories,
        })
    }
}

fn parse<T: DeserializeOwned>(table: &str, json: &str) -> PlanResult<T> {
    serde_json::from_str(json).map_err(|source| PlanError::RuleTableParse {
        table: table.to_string(),
        source,
    })
}

/// Validated, read-only rule tables
#[derive(Debug, Clone)]
pub struct RuleTables {
    meal_count: MealCountRules,
    timing: TimingRules,
    allocation: Vec<CalorieAllocationRule>,
    categories: Vec<ExchangeCategory>,
    thresholds: ValidationThresholds,
    advisories: BTreeMap<String, Vec<TimingAdvisory>>,
}

impl RuleTables {
    pub fn builtin() -> PlanResult<Self> {
        Self::from_sources(RuleSources::builtin())
    }

    pub fn load_dir(dir: &Path) -> PlanResult<Self> {
        info!("Loading rule tables from {}", dir.display());
        Self::from_sources(RuleSources::read_dir(dir)?)
    }

    pub fn from_sources(sources: RuleSources) -> PlanResult<Self> {
        let meal_count: MealCountRules = parse(MEAL_COUNT_FILE, &sources.meal_count)?;
        meal_count.validate()?;

        let records: Vec<TimingRuleRecord> = parse(MEAL_TIMING_FILE, &sources.meal_timing)?;
        let timing = TimingRules::from_records(records)?;

        let allocation: Vec<CalorieAllocationRule> =
            parse(CALORIE_ALLOCATION_FILE, &sources.calorie_allocation)?;
        for rule in &allocation {
            rule.validate()?;
        }
        if !allocation.iter().any(|r| r.is_default) {
            return Err(PlanError::config("No default calorie allocation rule"));
        }

        let categories: Vec<ExchangeCategory> =
            parse(EXCHANGE_CATEGORIES_FILE, &sources.exchange_categories)?;
        for (i, category) in categories.iter().enumerate() {
            category.validate()?;
            if categories[..i].iter().any(|c| c.id() == category.id()) {
                return Err(PlanError::config(format!(
                    "Duplicate exchange category '{}'",
                    category.id()
                )));
            }
        }

        let thresholds: ValidationThresholds = parse(THRESHOLDS_FILE, &sources.thresholds)?;
        thresholds.validate()?;

        let advisories: BTreeMap<String, Vec<TimingAdvisory>> = match &sources.advisories {
            Some(json) => parse::<BTreeMap<String, Vec<TimingAdvisory>>>(ADVISORIES_FILE, json)?
                .into_iter()
                .map(|(dosha, list)| (dosha.trim().to_lowercase(), list))
                .collect(),
            None => BTreeMap::new(),
        };

        info!(
            "Rule tables loaded: {} calorie ranges, {} timing rules, {} allocation rules, {} exchange categories",
            meal_count.calorie_ranges.len(),
            timing.by_kind.len() + usize::from(timing.fallback.is_some()),
            allocation.len(),
            categories.len()
        );

        Ok(Self {
            meal_count,
            timing,
            allocation,
            categories,
            thresholds,
            advisories,
        })
    }

    // ========================================================================
    // Meal count
    // ========================================================================

    pub fn meal_count_rules(&self) -> &MealCountRules {
        &self.meal_count
    }

    pub fn meal_count_bounds(&self) -> (u8, u8) {
        self.meal_count.bounds()
    }

    pub fn meal_count_by_calories(&self, calories: f64) -> Option<u8> {
        self.meal_count.count_for_calories(calories)
    }

    pub fn meal_count_by_eating_hours(&self, eating_hours: u32) -> Option<u8> {
        self.meal_count.count_for_eating_hours(eating_hours)
    }

    // ========================================================================
    // Timing
    // ========================================================================

    pub fn timing_rule(&self, kind: MealKind) -> Option<&TimingFormula> {
        self.timing.get(kind)
    }

    pub fn thresholds(&self) -> &ValidationThresholds {
        &self.thresholds
    }

    /// Advisory nudges for one dosha; unknown doshas have none
    pub fn advisories_for_dosha(&self, dosha: &str) -> &[TimingAdvisory] {
        self.advisories
            .get(&dosha.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ========================================================================
    // Calorie allocation
    // ========================================================================

    pub fn calorie_allocation_rules(&self) -> &[CalorieAllocationRule] {
        &self.allocation
    }

    pub fn default_calorie_allocation(&self) -> Option<&CalorieAllocationRule> {
        self.allocation.iter().find(|r| r.is_default)
    }

    pub fn calorie_allocation(&self, context: &AllocationContext) -> Option<&CalorieAllocationRule> {
        select_rule(&self.allocation, context)
    }

    /// Redistribution ratios for a scenario: the selected rule's own, else the
    /// default rule's. There is no built-in fallback.
    pub fn redistribution(
        &self,
        rule: &CalorieAllocationRule,
        scenario: RedistributionScenario,
    ) -> PlanResult<RedistributionRatios> {
        rule.redistribution_rules
            .get(scenario)
            .or_else(|| {
                self.default_calorie_allocation()
                    .and_then(|d| d.redistribution_rules.get(scenario))
            })
            .copied()
            .ok_or_else(|| {
                PlanError::config(format!(
                    "No '{}' redistribution ratios in rule '{}' or the default rule",
                    scenario.as_str(),
                    rule.rule_id
                ))
            })
    }

    /// Weight-loss snack policy: the selected rule's own, else the default rule's
    pub fn snack_policy(&self, rule: &CalorieAllocationRule) -> PlanResult<SnackPolicy> {
        rule.snack_policy
            .or_else(|| self.default_calorie_allocation().and_then(|d| d.snack_policy))
            .ok_or_else(|| {
                PlanError::config(format!(
                    "No weight-loss snack policy in rule '{}' or the default rule",
                    rule.rule_id
                ))
            })
    }

    // ========================================================================
    // Exchange categories
    // ========================================================================

    pub fn exchange_category(&self, id: &str) -> Option<&ExchangeCategory> {
        self.categories.iter().find(|c| c.id() == id)
    }

    pub fn exchange_categories(&self) -> &[ExchangeCategory] {
        &self.categories
    }
}
