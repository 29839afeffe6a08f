//! Meal structure engine

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::meal_count::determine_meal_count;
use super::meal_names::{assign_meal_names, MealNames};
use super::nudges::apply_advisories;
use super::timing::{calculate_timing_windows, clip_to_buffers, TimingOutcome};
use super::validate::validate_structure;
use super::weights::{calculate_energy_weights, WeightOutcome};
use crate::error::{PlanError, PlanResult};
use crate::models::{
    AllocationContext, BehavioralPreferences, ClientSchedule, MealSlot, MealStructure, MealWindow,
    NutritionTargets, TimingAdvisory,
};
use crate::rules::RuleTables;
use crate::timing::DayFrame;

/// Builds the daily meal skeleton from a schedule, targets and preferences
#[derive(Debug, Clone, Copy)]
pub struct MealStructureEngine<'a> {
    tables: &'a RuleTables,
}

impl<'a> MealStructureEngine<'a> {
    pub fn new(tables: &'a RuleTables) -> Self {
        Self { tables }
    }

    pub fn determine_meal_count(
        &self,
        calories_target: f64,
        prefs: &BehavioralPreferences,
    ) -> PlanResult<usize> {
        determine_meal_count(self.tables, calories_target, prefs)
    }

    pub fn assign_meal_names(&self, count: usize, prefs: &BehavioralPreferences) -> MealNames {
        assign_meal_names(count, prefs)
    }

    /// Base windows, advisory nudges, then the final buffer clip
    pub fn calculate_timing_windows(
        &self,
        slots: &[MealSlot],
        frame: &DayFrame,
        advisories: &[TimingAdvisory],
    ) -> PlanResult<TimingOutcome> {
        let TimingOutcome { mut meals, mut flags } =
            calculate_timing_windows(self.tables, slots, frame)?;
        if !advisories.is_empty() {
            apply_advisories(frame, self.tables.thresholds(), &mut meals, advisories, &mut flags);
        }
        let meals = clip_to_buffers(self.tables, frame, meals, &mut flags);
        Ok(TimingOutcome { meals, flags })
    }

    pub fn calculate_energy_weights(
        &self,
        slots: &[MealSlot],
        context: &AllocationContext,
    ) -> PlanResult<WeightOutcome> {
        calculate_energy_weights(self.tables, slots, context)
    }

    pub fn validate_structure(
        &self,
        structure: &mut MealStructure,
        frame: &DayFrame,
    ) -> PlanResult<Vec<String>> {
        validate_structure(structure, frame, self.tables.thresholds())
    }

    /// Caller nudges followed by the rule-table nudges for each imbalanced dosha
    fn collect_advisories(
        &self,
        context: &AllocationContext,
        advisories: &[TimingAdvisory],
    ) -> Vec<TimingAdvisory> {
        let mut all = advisories.to_vec();
        for dosha in &context.imbalanced_doshas {
            for advisory in self.tables.advisories_for_dosha(dosha) {
                if !all.contains(advisory) {
                    all.push(*advisory);
                }
            }
        }
        all
    }

    /// Run the full pipeline: count, names, timing, weights, validation
    pub fn generate(
        &self,
        schedule: &ClientSchedule,
        targets: &NutritionTargets,
        prefs: &BehavioralPreferences,
        context: &AllocationContext,
        advisories: &[TimingAdvisory],
    ) -> PlanResult<MealStructure> {
        targets.validate()?;
        prefs.validate()?;
        let frame = schedule.day_frame()?;

        let count = self.determine_meal_count(targets.target_calories, prefs)?;
        let MealNames { slots, mut flags } = self.assign_meal_names(count, prefs);
        debug!("Meal slots: {:?}", slots.iter().map(|s| s.name()).collect::<Vec<_>>());

        let advisories = self.collect_advisories(context, advisories);
        let timing = self.calculate_timing_windows(&slots, &frame, &advisories)?;
        flags.extend(timing.flags);
        if timing.meals.is_empty() {
            return Err(PlanError::input(format!(
                "No meal fits between wake ({}) and sleep ({})",
                frame.wake(),
                frame.sleep()
            )));
        }

        let placed: Vec<MealSlot> = timing.meals.iter().map(|m| m.slot).collect();
        let weights = self.calculate_energy_weights(&placed, context)?;
        flags.extend(weights.flags);

        let meals: Vec<_> = timing
            .meals
            .iter()
            .filter(|m| !weights.pruned.contains(&m.slot))
            .collect();
        let mut structure = MealStructure {
            meal_count: meals.len(),
            meals: meals.iter().map(|m| m.slot.name()).collect(),
            timing_windows: meals
                .iter()
                .map(|m| (m.slot.name(), MealWindow::from_span(&frame, m.span)))
                .collect::<BTreeMap<_, _>>(),
            energy_weight: weights
                .weights
                .iter()
                .map(|(slot, w)| (slot.name(), *w))
                .collect::<BTreeMap<_, _>>(),
            flags: Vec::new(),
        };

        flags.extend(self.validate_structure(&mut structure, &frame)?);
        structure.flags = flags;

        info!(
            "Meal structure: {} meals ({}), {} flags",
            structure.meal_count,
            structure.meals.join(", "),
            structure.flags.len()
        );
        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ClockTime;

    fn prefs(snacks: bool) -> BehavioralPreferences {
        BehavioralPreferences {
            snack_preference: snacks,
            ..Default::default()
        }
    }

    fn generate(
        tables: &RuleTables,
        wake: &str,
        sleep: &str,
        calories: f64,
        prefs: &BehavioralPreferences,
        context: &AllocationContext,
    ) -> PlanResult<MealStructure> {
        MealStructureEngine::new(tables).generate(
            &ClientSchedule::new(wake, sleep),
            &NutritionTargets::new(calories, 80.0),
            prefs,
            context,
            &[],
        )
    }

    fn assert_invariants(structure: &MealStructure, sleep_offset: i32) {
        assert!((structure.weight_sum() - 1.0).abs() < 1e-4);
        assert_eq!(structure.meal_count, structure.meals.len());
        let spans: Vec<_> = structure
            .meals
            .iter()
            .map(|m| structure.window_of(m).unwrap().span())
            .collect();
        for (i, a) in spans.iter().enumerate() {
            for b in &spans[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
        for meal in &structure.meals {
            let end = structure.window_of(meal).unwrap().end_offset_minutes;
            if meal.starts_with("dinner") {
                assert!(sleep_offset - end >= 180, "{} ends too late", meal);
            } else {
                assert!(sleep_offset - end >= 60, "{} ends too late", meal);
            }
        }
    }

    #[test]
    fn test_worked_example_day() {
        let tables = RuleTables::builtin().unwrap();
        let structure = generate(
            &tables,
            "07:00",
            "22:00",
            1800.0,
            &prefs(true),
            &AllocationContext::default(),
        )
        .unwrap();
        assert_eq!(structure.meals, vec!["breakfast", "lunch", "dinner", "snack1"]);
        assert!((structure.weight_of("breakfast") - 0.25).abs() < 1e-9);
        assert!((structure.weight_of("snack1") - 0.10).abs() < 1e-9);
        let dinner = structure.window_of("dinner").unwrap();
        assert_eq!(dinner.start, ClockTime::parse("17:30").unwrap());
        assert_eq!(dinner.end, ClockTime::parse("19:00").unwrap());
        assert!(structure.flags.is_empty());
        assert_invariants(&structure, 900);
    }

    #[test]
    fn test_invariants_across_schedules() {
        let tables = RuleTables::builtin().unwrap();
        let schedules = [
            ("06:00", "22:00", 960),
            ("07:00", "23:30", 990),
            ("14:00", "02:00", 720),
            ("22:00", "14:00", 960),
            ("05:30", "21:00", 930),
        ];
        for (wake, sleep, sleep_offset) in schedules {
            for calories in [1000.0, 1800.0, 2400.0, 3200.0] {
                for snacks in [true, false] {
                    let structure = generate(
                        &tables,
                        wake,
                        sleep,
                        calories,
                        &prefs(snacks),
                        &AllocationContext::default(),
                    )
                    .unwrap();
                    assert_invariants(&structure, sleep_offset);
                }
            }
        }
    }

    #[test]
    fn test_weight_loss_and_condition_contexts() {
        let tables = RuleTables::builtin().unwrap();
        let contexts = [
            AllocationContext {
                primary_goal: Some("weight_loss".to_string()),
                ..Default::default()
            },
            AllocationContext {
                medical_conditions: vec!["gerd".to_string()],
                ..Default::default()
            },
            AllocationContext {
                imbalanced_doshas: vec!["kapha".to_string(), "pitta".to_string()],
                ..Default::default()
            },
        ];
        for context in &contexts {
            let prefs = BehavioralPreferences {
                explicit_meal_count: Some(6),
                snack_preference: true,
                ..Default::default()
            };
            let structure = generate(&tables, "07:00", "23:00", 2000.0, &prefs, context).unwrap();
            assert_invariants(&structure, 960);
        }
    }

    #[test]
    fn test_kapha_moves_dinner_before_six() {
        let tables = RuleTables::builtin().unwrap();
        let context = AllocationContext {
            imbalanced_doshas: vec!["kapha".to_string()],
            ..Default::default()
        };
        let structure =
            generate(&tables, "07:00", "23:30", 1000.0, &prefs(false), &context).unwrap();
        let dinner = structure.window_of("dinner").unwrap();
        assert_eq!(dinner.end, ClockTime::parse("18:00").unwrap());
        assert_invariants(&structure, 990);
    }

    #[test]
    fn test_five_meals_without_snacks_on_long_day() {
        let tables = RuleTables::builtin().unwrap();
        let prefs = BehavioralPreferences {
            explicit_meal_count: Some(5),
            ..prefs(false)
        };
        let structure = generate(
            &tables,
            "05:00",
            "23:59",
            2200.0,
            &prefs,
            &AllocationContext::default(),
        )
        .unwrap();
        assert_eq!(
            structure.meals,
            vec!["breakfast", "lunch", "lunch2", "dinner", "dinner2"]
        );
        assert!(structure.flags.is_empty(), "{:?}", structure.flags);
        assert!(structure.weight_of("dinner2") > 0.0);
        assert_invariants(&structure, 1139);
    }

    #[test]
    fn test_idempotent() {
        let tables = RuleTables::builtin().unwrap();
        let run = || {
            let structure = generate(
                &tables,
                "06:30",
                "23:00",
                2200.0,
                &prefs(true),
                &AllocationContext::default(),
            )
            .unwrap();
            serde_json::to_string(&structure).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_input_errors() {
        let tables = RuleTables::builtin().unwrap();
        let err = generate(
            &tables,
            "07:00",
            "07:00",
            1800.0,
            &prefs(true),
            &AllocationContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InputValidation(_)));

        let err = generate(
            &tables,
            "07:00",
            "22:00",
            0.0,
            &prefs(true),
            &AllocationContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InputValidation(_)));
    }

    #[test]
    fn test_day_too_short_for_any_meal() {
        let tables = RuleTables::builtin().unwrap();
        let err = generate(
            &tables,
            "07:00",
            "08:00",
            1800.0,
            &prefs(true),
            &AllocationContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InputValidation(_)));
    }
}
