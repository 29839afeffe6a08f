//! Post-build structure checks
//!
//! Problems found here are reported as flags; only the weight sum is repaired.

use std::collections::BTreeMap;

use tracing::warn;

use super::weights::finalize_weights;
use crate::error::PlanResult;
use crate::models::{MealKind, MealSlot, MealStructure};
use crate::rules::ValidationThresholds;
use crate::timing::DayFrame;

/// Re-check a finished structure and return any new flags.
///
/// A weight sum that drifted past the tolerance is renormalised in place. Overlaps and
/// buffer violations are flagged but left as they are.
pub fn validate_structure(
    structure: &mut MealStructure,
    frame: &DayFrame,
    thresholds: &ValidationThresholds,
) -> PlanResult<Vec<String>> {
    let mut flags = Vec::new();

    let total = structure.weight_sum();
    if (total - 1.0).abs() > thresholds.weight_sum_tolerance {
        warn!("Energy weights sum to {:.4}; renormalising", total);
        let ordered: Vec<(MealSlot, f64)> = structure
            .meals
            .iter()
            .map(|name| (slot_of(name), structure.weight_of(name)))
            .collect();
        let (weights, _) = finalize_weights(ordered)?;
        structure.energy_weight = structure
            .meals
            .iter()
            .cloned()
            .zip(weights.into_iter().map(|(_, w)| w))
            .collect::<BTreeMap<_, _>>();
        flags.push(format!("energy_weights_normalized_from_{:.3}", total));
    }

    let windows: Vec<(&String, _)> = structure
        .meals
        .iter()
        .filter_map(|name| structure.window_of(name).map(|w| (name, w.span())))
        .collect();
    for (i, (a, span_a)) in windows.iter().enumerate() {
        for (b, span_b) in &windows[i + 1..] {
            if span_a.overlaps(span_b) {
                warn!("Timing windows for {} and {} overlap", a, b);
                flags.push(format!("timing_overlap_{}_{}", a, b));
            }
        }
    }

    for (name, span) in &windows {
        let hours_left = frame.hours_before_sleep(span.end);
        match MealKind::of_meal(name) {
            Some(MealKind::Dinner) if hours_left < thresholds.dinner_min_hours_before_sleep => {
                flags.push(format!("{}_too_close_to_sleep_{:.1}hrs", name, hours_left));
            }
            Some(MealKind::Snack) if hours_left < thresholds.snack_min_hours_before_sleep => {
                flags.push(format!("{}_too_close_to_sleep_{:.1}hrs", name, hours_left));
            }
            _ => {}
        }
    }

    Ok(flags)
}

/// Only the kind matters for finalising weights
fn slot_of(name: &str) -> MealSlot {
    MealSlot::first(MealKind::of_meal(name).unwrap_or(MealKind::Snack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientSchedule, MealWindow};
    use crate::timing::Span;

    fn thresholds() -> ValidationThresholds {
        ValidationThresholds {
            dinner_min_hours_before_sleep: 3.0,
            snack_min_hours_before_sleep: 1.0,
            weight_sum_tolerance: 0.01,
        }
    }

    fn structure(frame: &DayFrame, meals: &[(&str, i32, i32, f64)]) -> MealStructure {
        MealStructure {
            meal_count: meals.len(),
            meals: meals.iter().map(|m| m.0.to_string()).collect(),
            timing_windows: meals
                .iter()
                .map(|m| (m.0.to_string(), MealWindow::from_span(frame, Span::new(m.1, m.2))))
                .collect(),
            energy_weight: meals.iter().map(|m| (m.0.to_string(), m.3)).collect(),
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_clean_structure_has_no_flags() {
        let frame = ClientSchedule::new("07:00", "22:00").day_frame().unwrap();
        let mut s = structure(
            &frame,
            &[
                ("breakfast", 30, 90, 0.3),
                ("lunch", 300, 360, 0.4),
                ("dinner", 630, 720, 0.3),
            ],
        );
        let flags = validate_structure(&mut s, &frame, &thresholds()).unwrap();
        assert!(flags.is_empty());
    }

    #[test]
    fn test_drift_is_renormalised() {
        let frame = ClientSchedule::new("07:00", "22:00").day_frame().unwrap();
        let mut s = structure(
            &frame,
            &[("breakfast", 30, 90, 0.5), ("lunch", 300, 360, 0.7)],
        );
        let flags = validate_structure(&mut s, &frame, &thresholds()).unwrap();
        assert_eq!(flags, vec!["energy_weights_normalized_from_1.200"]);
        assert!((s.weight_sum() - 1.0).abs() < 1e-4);
        assert!((s.weight_of("lunch") - 0.58).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_and_buffer_flags() {
        let frame = ClientSchedule::new("07:00", "22:00").day_frame().unwrap();
        let mut s = structure(
            &frame,
            &[
                ("breakfast", 30, 90, 0.3),
                ("lunch", 60, 120, 0.3),
                ("dinner", 700, 800, 0.4),
            ],
        );
        let flags = validate_structure(&mut s, &frame, &thresholds()).unwrap();
        assert!(flags.contains(&"timing_overlap_breakfast_lunch".to_string()));
        assert!(flags.contains(&"dinner_too_close_to_sleep_1.7hrs".to_string()));
        // Flags only; windows are untouched
        assert_eq!(s.window_of("lunch").unwrap().span(), Span::new(60, 120));
    }
}
