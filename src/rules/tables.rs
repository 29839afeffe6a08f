//! Typed rule-table records
//!
//! Each table is deserialized from JSON, then checked once at load time so the engines
//! can rely on the values without re-validating them on every run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::models::{MealKind, Nutrition};
use crate::timing::hours_to_minutes;

// ============================================================================
// Meal Count Rules
// ============================================================================

/// Calorie breakpoint; `min`/`max` of None mean unbounded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalorieRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub meal_count: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastingWindowRule {
    pub eating_hours_min: Option<u32>,
    pub eating_hours_max: Option<u32>,
    pub meal_count: u8,
}

impl FastingWindowRule {
    fn matches(&self, eating_hours: u32) -> bool {
        let above_min = self.eating_hours_min.map_or(true, |min| eating_hours >= min);
        let below_max = self.eating_hours_max.map_or(true, |max| eating_hours <= max);
        above_min && below_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCountRules {
    pub rule_id: String,
    pub min_meals: Option<u8>,
    pub max_meals: Option<u8>,
    pub calorie_ranges: Vec<CalorieRange>,
    #[serde(default)]
    pub fasting_window_rules: Vec<FastingWindowRule>,
}

impl MealCountRules {
    pub(crate) fn validate(&self) -> PlanResult<()> {
        let (min, max) = match (self.min_meals, self.max_meals) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(PlanError::config(format!(
                    "Meal count rule '{}' is missing min_meals or max_meals",
                    self.rule_id
                )))
            }
        };
        if min == 0 || min > max {
            return Err(PlanError::config(format!(
                "Meal count rule '{}' has invalid bounds [{}, {}]",
                self.rule_id, min, max
            )));
        }
        if self.calorie_ranges.is_empty() {
            return Err(PlanError::config(format!(
                "Meal count rule '{}' has no calorie ranges",
                self.rule_id
            )));
        }

        // Breakpoints must ascend and counts must never drop, so that more calories
        // can never yield fewer meals
        for (i, pair) in self.calorie_ranges.windows(2).enumerate() {
            let (lower, upper) = (&pair[0], &pair[1]);
            let lower_max = lower.max.ok_or_else(|| {
                PlanError::config(format!(
                    "Calorie range {} is open-ended but is not the last range",
                    i
                ))
            })?;
            if let Some(upper_max) = upper.max {
                if upper_max <= lower_max {
                    return Err(PlanError::config(format!(
                        "Calorie range breakpoints must ascend ({} then {})",
                        lower_max, upper_max
                    )));
                }
            }
            if upper.meal_count < lower.meal_count {
                return Err(PlanError::config(format!(
                    "Calorie range meal counts must not decrease ({} then {})",
                    lower.meal_count, upper.meal_count
                )));
            }
        }
        Ok(())
    }

    /// `(min_meals, max_meals)`; both are guaranteed present after load
    pub fn bounds(&self) -> (u8, u8) {
        (self.min_meals.unwrap_or(1), self.max_meals.unwrap_or(1))
    }

    /// Base meal count for a calorie target, before preference caps.
    ///
    /// The first range whose upper bound is open or not below the target wins, so
    /// every target lands in exactly one range.
    pub fn count_for_calories(&self, calories: f64) -> Option<u8> {
        self.calorie_ranges
            .iter()
            .find(|r| r.max.map_or(true, |max| calories <= max))
            .or_else(|| self.calorie_ranges.last())
            .map(|r| r.meal_count)
    }

    pub fn count_for_eating_hours(&self, eating_hours: u32) -> Option<u8> {
        self.fasting_window_rules
            .iter()
            .find(|r| r.matches(eating_hours))
            .map(|r| r.meal_count)
    }
}

// ============================================================================
// Meal Timing Rules
// ============================================================================

/// Raw timing record as authored in `meal_timing_rules.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingRuleRecord {
    pub meal_type: String,
    pub timing_rule: Option<String>,
    pub start_offset_minutes: Option<i32>,
    pub end_offset_minutes: Option<i32>,
    pub start_offset_hours: Option<f64>,
    pub end_offset_hours: Option<f64>,
    pub window_duration_hours: Option<f64>,
    pub fallback_rule: Option<String>,
    pub fallback_start_offset_hours: Option<f64>,
    pub fallback_end_offset_hours: Option<f64>,
    pub min_hours_before_sleep: Option<f64>,
    pub min_hours_after_previous_meal: Option<f64>,
}

/// How a meal's window is placed, with all offsets in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingFormula {
    /// Fixed window measured from wake time
    RelativeToWake { start: i32, end: i32 },
    /// Window measured from the end of the previous meal
    RelativeToPreviousMeal {
        start: i32,
        end: i32,
        /// Length used when the window has to be pulled earlier
        duration: Option<i32>,
        /// Wake-relative offsets used when no meal precedes this one
        wake_fallback: Option<(i32, i32)>,
    },
    /// Window computed backward from sleep time
    RelativeToSleep {
        buffer: i32,
        duration: i32,
        min_gap: i32,
    },
}

fn require<T>(value: Option<T>, field: &str, meal_type: &str) -> PlanResult<T> {
    value.ok_or_else(|| {
        PlanError::config(format!(
            "Timing rule for '{}' is missing '{}'",
            meal_type, field
        ))
    })
}

impl TimingRuleRecord {
    pub(crate) fn into_formula(self) -> PlanResult<TimingFormula> {
        let meal = self.meal_type.as_str();
        let rule = require(self.timing_rule.as_deref(), "timing_rule", meal)?;
        match rule {
            "relative_to_wake" => {
                let start = require(self.start_offset_minutes, "start_offset_minutes", meal)?;
                let end = require(self.end_offset_minutes, "end_offset_minutes", meal)?;
                check_order(start, end, meal)?;
                Ok(TimingFormula::RelativeToWake { start, end })
            }
            "relative_to_previous_meal" => {
                let start = hours_to_minutes(require(self.start_offset_hours, "start_offset_hours", meal)?);
                let end = hours_to_minutes(require(self.end_offset_hours, "end_offset_hours", meal)?);
                check_order(start, end, meal)?;
                let wake_fallback = match self.fallback_rule.as_deref() {
                    Some("relative_to_wake") => {
                        let fb_start = hours_to_minutes(require(
                            self.fallback_start_offset_hours,
                            "fallback_start_offset_hours",
                            meal,
                        )?);
                        let fb_end = hours_to_minutes(require(
                            self.fallback_end_offset_hours,
                            "fallback_end_offset_hours",
                            meal,
                        )?);
                        check_order(fb_start, fb_end, meal)?;
                        Some((fb_start, fb_end))
                    }
                    Some(other) => {
                        return Err(PlanError::config(format!(
                            "Unsupported fallback_rule '{}' for '{}'",
                            other, meal
                        )))
                    }
                    None => None,
                };
                let duration = self.window_duration_hours.map(hours_to_minutes);
                if duration.map_or(false, |d| d <= 0) {
                    return Err(PlanError::config(format!(
                        "window_duration_hours for '{}' must be > 0",
                        meal
                    )));
                }
                Ok(TimingFormula::RelativeToPreviousMeal {
                    start,
                    end,
                    duration,
                    wake_fallback,
                })
            }
            "relative_to_sleep" => {
                let buffer = hours_to_minutes(require(self.min_hours_before_sleep, "min_hours_before_sleep", meal)?);
                let duration = hours_to_minutes(require(self.window_duration_hours, "window_duration_hours", meal)?);
                let min_gap = hours_to_minutes(require(
                    self.min_hours_after_previous_meal,
                    "min_hours_after_previous_meal",
                    meal,
                )?);
                if duration <= 0 || buffer < 0 || min_gap < 0 {
                    return Err(PlanError::config(format!(
                        "Sleep-relative timing rule for '{}' has negative or empty values",
                        meal
                    )));
                }
                Ok(TimingFormula::RelativeToSleep {
                    buffer,
                    duration,
                    min_gap,
                })
            }
            other => Err(PlanError::config(format!(
                "Unknown timing_rule '{}' for '{}'",
                other, meal
            ))),
        }
    }
}

fn check_order(start: i32, end: i32, meal: &str) -> PlanResult<()> {
    if end <= start {
        return Err(PlanError::config(format!(
            "Timing rule for '{}' ends before it starts ({} >= {})",
            meal, start, end
        )));
    }
    Ok(())
}

/// Timing formulas keyed by meal kind, with an optional catch-all
#[derive(Debug, Clone, Default)]
pub struct TimingRules {
    pub(crate) by_kind: BTreeMap<MealKind, TimingFormula>,
    pub(crate) fallback: Option<TimingFormula>,
}

impl TimingRules {
    pub(crate) fn from_records(records: Vec<TimingRuleRecord>) -> PlanResult<Self> {
        let mut rules = TimingRules::default();
        for record in records {
            let meal_type = record.meal_type.trim().to_lowercase();
            if meal_type == "default" {
                rules.fallback = Some(record.into_formula()?);
                continue;
            }
            let kind = MealKind::from_str(&meal_type).ok_or_else(|| {
                PlanError::config(format!("Unknown meal_type '{}' in timing rules", meal_type))
            })?;
            rules.by_kind.insert(kind, record.into_formula()?);
        }
        Ok(rules)
    }

    pub fn get(&self, kind: MealKind) -> Option<&TimingFormula> {
        self.by_kind.get(&kind).or(self.fallback.as_ref())
    }
}

// ============================================================================
// Calorie Allocation Rules
// ============================================================================

/// Main-meal shares of daily energy, in percent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MealPercentages {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
}

impl MealPercentages {
    /// Weight (0-1) for a main meal kind; snacks have no fixed share
    pub fn weight_for(&self, kind: MealKind) -> Option<f64> {
        match kind {
            MealKind::Breakfast => Some(self.breakfast / 100.0),
            MealKind::Lunch => Some(self.lunch / 100.0),
            MealKind::Dinner => Some(self.dinner / 100.0),
            MealKind::Snack => None,
        }
    }
}

/// How surplus weight is pushed back into the main meals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RedistributionRatios {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
}

impl RedistributionRatios {
    pub fn ratio_for(&self, kind: MealKind) -> f64 {
        match kind {
            MealKind::Breakfast => self.breakfast,
            MealKind::Lunch => self.lunch,
            MealKind::Dinner => self.dinner,
            MealKind::Snack => 0.0,
        }
    }

    /// Ratios restricted to the kinds present, rescaled to sum to 1.
    ///
    /// Returns None if none of the present kinds has a positive ratio.
    pub fn normalized_over(&self, present: &[MealKind]) -> Option<BTreeMap<MealKind, f64>> {
        let total: f64 = present.iter().map(|k| self.ratio_for(*k)).sum();
        if total <= 0.0 {
            return None;
        }
        Some(
            present
                .iter()
                .map(|k| (*k, self.ratio_for(*k) / total))
                .collect(),
        )
    }

    fn validate(&self, rule_id: &str) -> PlanResult<()> {
        let values = [self.breakfast, self.lunch, self.dinner];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) || values.iter().sum::<f64>() <= 0.0 {
            return Err(PlanError::config(format!(
                "Redistribution ratios in rule '{}' must be non-negative with a positive sum",
                rule_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedistributionScenario {
    /// No snack slots: the whole snack share goes back to the main meals
    NoSnacks,
    /// Weight-loss snack caps left a surplus
    WeightLossSurplus,
}

impl RedistributionScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedistributionScenario::NoSnacks => "no_snacks",
            RedistributionScenario::WeightLossSurplus => "weight_loss_surplus",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedistributionRules {
    #[serde(default)]
    pub no_snacks: Option<RedistributionRatios>,
    #[serde(default)]
    pub weight_loss_surplus: Option<RedistributionRatios>,
}

impl RedistributionRules {
    pub fn get(&self, scenario: RedistributionScenario) -> Option<&RedistributionRatios> {
        match scenario {
            RedistributionScenario::NoSnacks => self.no_snacks.as_ref(),
            RedistributionScenario::WeightLossSurplus => self.weight_loss_surplus.as_ref(),
        }
    }
}

/// Snack caps applied under a weight-loss goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnackPolicy {
    pub weight_loss_max_snack_fraction: f64,
    pub weight_loss_max_snacks: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalorieAllocationRule {
    pub rule_id: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub applies_to: Vec<String>,
    pub meal_type_percentages: MealPercentages,
    #[serde(default)]
    pub redistribution_rules: RedistributionRules,
    #[serde(default)]
    pub snack_policy: Option<SnackPolicy>,
}

impl CalorieAllocationRule {
    pub(crate) fn validate(&self) -> PlanResult<()> {
        let p = &self.meal_type_percentages;
        for (meal, pct) in [("breakfast", p.breakfast), ("lunch", p.lunch), ("dinner", p.dinner)] {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(PlanError::config(format!(
                    "Rule '{}' has {} percentage {} outside 0-100",
                    self.rule_id, meal, pct
                )));
            }
        }
        if let Some(ratios) = &self.redistribution_rules.no_snacks {
            ratios.validate(&self.rule_id)?;
        }
        if let Some(ratios) = &self.redistribution_rules.weight_loss_surplus {
            ratios.validate(&self.rule_id)?;
        }
        if let Some(policy) = &self.snack_policy {
            if !(0.0..=1.0).contains(&policy.weight_loss_max_snack_fraction) {
                return Err(PlanError::config(format!(
                    "Rule '{}' has snack fraction {} outside 0-1",
                    self.rule_id, policy.weight_loss_max_snack_fraction
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Exchange Categories
// ============================================================================

/// One food-exchange category with its per-exchange reference values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeCategory {
    pub exchange_category_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Grams of food in one exchange
    pub amount_per_exchange_g: f64,
    pub nutrition_per_exchange: Nutrition,
}

impl ExchangeCategory {
    pub fn id(&self) -> &str {
        &self.exchange_category_id
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.exchange_category_id)
    }

    pub(crate) fn validate(&self) -> PlanResult<()> {
        let n = &self.nutrition_per_exchange;
        let values = [n.calories, n.protein_g, n.carbs_g, n.fat_g, self.amount_per_exchange_g];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(PlanError::config(format!(
                "Exchange category '{}' has negative or non-numeric values",
                self.exchange_category_id
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Validation Thresholds
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationThresholds {
    pub dinner_min_hours_before_sleep: f64,
    pub snack_min_hours_before_sleep: f64,
    /// Allowed drift of the weight sum before it is renormalised and flagged
    pub weight_sum_tolerance: f64,
}

impl ValidationThresholds {
    pub fn dinner_buffer_minutes(&self) -> i32 {
        hours_to_minutes(self.dinner_min_hours_before_sleep)
    }

    pub fn snack_buffer_minutes(&self) -> i32 {
        hours_to_minutes(self.snack_min_hours_before_sleep)
    }

    /// Buffer before sleep for a meal kind: dinners use the dinner buffer, all
    /// other meals the snack buffer
    pub fn buffer_minutes_for(&self, kind: MealKind) -> i32 {
        match kind {
            MealKind::Dinner => self.dinner_buffer_minutes(),
            _ => self.snack_buffer_minutes(),
        }
    }

    pub(crate) fn validate(&self) -> PlanResult<()> {
        if self.dinner_min_hours_before_sleep < 0.0
            || self.snack_min_hours_before_sleep < 0.0
            || self.weight_sum_tolerance <= 0.0
        {
            return Err(PlanError::config(
                "Validation thresholds must be non-negative with a positive weight tolerance",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_rules(json: &str) -> MealCountRules {
        serde_json::from_str(json).unwrap()
    }

    const COUNT_JSON: &str = r#"{
        "rule_id": "t", "min_meals": 1, "max_meals": 7,
        "calorie_ranges": [
            {"min": null, "max": 1200, "meal_count": 3},
            {"min": 1200, "max": 2000, "meal_count": 4},
            {"min": 2000, "max": null, "meal_count": 5}
        ],
        "fasting_window_rules": [
            {"eating_hours_min": null, "eating_hours_max": 6, "meal_count": 2},
            {"eating_hours_min": 7, "eating_hours_max": null, "meal_count": 3}
        ]
    }"#;

    #[test]
    fn test_count_for_calories_has_no_gaps() {
        let rules = count_rules(COUNT_JSON);
        rules.validate().unwrap();
        assert_eq!(rules.count_for_calories(900.0), Some(3));
        assert_eq!(rules.count_for_calories(1200.0), Some(3));
        assert_eq!(rules.count_for_calories(1200.5), Some(4));
        assert_eq!(rules.count_for_calories(5000.0), Some(5));
    }

    #[test]
    fn test_count_for_eating_hours() {
        let rules = count_rules(COUNT_JSON);
        assert_eq!(rules.count_for_eating_hours(4), Some(2));
        assert_eq!(rules.count_for_eating_hours(8), Some(3));
    }

    #[test]
    fn test_decreasing_counts_rejected() {
        let rules = count_rules(
            r#"{"rule_id": "bad", "min_meals": 1, "max_meals": 7,
                "calorie_ranges": [
                    {"min": null, "max": 1500, "meal_count": 5},
                    {"min": 1500, "max": null, "meal_count": 3}
                ]}"#,
        );
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_missing_bounds_rejected() {
        let rules = count_rules(
            r#"{"rule_id": "bad", "calorie_ranges": [{"min": null, "max": null, "meal_count": 3}]}"#,
        );
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("min_meals"));
    }

    #[test]
    fn test_timing_record_conversion() {
        let record: TimingRuleRecord = serde_json::from_str(
            r#"{"meal_type": "dinner", "timing_rule": "relative_to_sleep",
                "min_hours_before_sleep": 3.0, "window_duration_hours": 1.5,
                "min_hours_after_previous_meal": 1.0}"#,
        )
        .unwrap();
        assert_eq!(
            record.into_formula().unwrap(),
            TimingFormula::RelativeToSleep {
                buffer: 180,
                duration: 90,
                min_gap: 60
            }
        );
    }

    #[test]
    fn test_timing_record_missing_field() {
        let record: TimingRuleRecord = serde_json::from_str(
            r#"{"meal_type": "lunch", "timing_rule": "relative_to_previous_meal",
                "start_offset_hours": 3.5}"#,
        )
        .unwrap();
        let err = record.into_formula().unwrap_err();
        assert!(matches!(err, PlanError::Configuration(_)));
        assert!(err.to_string().contains("end_offset_hours"));
    }

    #[test]
    fn test_timing_rules_default_fallback() {
        let records: Vec<TimingRuleRecord> = serde_json::from_str(
            r#"[{"meal_type": "default", "timing_rule": "relative_to_wake",
                 "start_offset_minutes": 0, "end_offset_minutes": 60}]"#,
        )
        .unwrap();
        let rules = TimingRules::from_records(records).unwrap();
        assert_eq!(
            rules.get(MealKind::Snack),
            Some(&TimingFormula::RelativeToWake { start: 0, end: 60 })
        );
    }

    #[test]
    fn test_redistribution_normalized_over_present_kinds() {
        let ratios = RedistributionRatios {
            breakfast: 0.2,
            lunch: 0.5,
            dinner: 0.3,
        };
        let shares = ratios
            .normalized_over(&[MealKind::Breakfast, MealKind::Lunch])
            .unwrap();
        assert!((shares[&MealKind::Breakfast] - 0.2 / 0.7).abs() < 1e-12);
        assert!((shares[&MealKind::Lunch] - 0.5 / 0.7).abs() < 1e-12);
        assert!(!shares.contains_key(&MealKind::Dinner));
    }

    #[test]
    fn test_allocation_rule_percentage_bounds() {
        let rule: CalorieAllocationRule = serde_json::from_str(
            r#"{"rule_id": "bad", "meal_type_percentages":
                {"breakfast": 120.0, "lunch": 35.0, "dinner": 30.0}}"#,
        )
        .unwrap();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_buffer_minutes_for_kind() {
        let thresholds = ValidationThresholds {
            dinner_min_hours_before_sleep: 3.0,
            snack_min_hours_before_sleep: 1.0,
            weight_sum_tolerance: 0.01,
        };
        assert_eq!(thresholds.buffer_minutes_for(MealKind::Dinner), 180);
        assert_eq!(thresholds.buffer_minutes_for(MealKind::Snack), 60);
        assert_eq!(thresholds.buffer_minutes_for(MealKind::Lunch), 60);
    }
}
