//! Meal count determination

use tracing::{debug, warn};

use crate::error::{PlanError, PlanResult};
use crate::models::BehavioralPreferences;
use crate::rules::RuleTables;

/// Number of meals for the day.
///
/// Priority: explicit count, then fasting window, then the calorie breakpoints.
/// The first two are clamped to the table's `[min, max]`; the calorie count is
/// clamped the same way and then capped by `prefs.max_meals`.
pub fn determine_meal_count(
    tables: &RuleTables,
    calories_target: f64,
    prefs: &BehavioralPreferences,
) -> PlanResult<usize> {
    let (min, max) = tables.meal_count_bounds();
    let clamp = |count: u8| count.clamp(min, max) as usize;

    if let Some(explicit) = prefs.explicit_meal_count {
        debug!("Using explicit meal count {}", explicit);
        return Ok(clamp(explicit));
    }

    if let Some(window) = prefs.fasting_window.as_deref() {
        match prefs.eating_hours() {
            Some(hours) => match tables.meal_count_by_eating_hours(hours) {
                Some(count) => {
                    debug!("Fasting window {} ({}h eating) gives {} meals", window, hours, count);
                    return Ok(clamp(count));
                }
                None => warn!("No fasting-window rule covers {}h of eating; using calories", hours),
            },
            None => warn!("Ignoring malformed fasting window '{}'", window),
        }
    }

    let base = tables.meal_count_by_calories(calories_target).ok_or_else(|| {
        PlanError::config(format!("No meal count rule for {} kcal", calories_target))
    })?;
    let count = clamp(base).min(prefs.max_meals as usize).max(1);
    debug!("{} kcal gives base {} meals, {} after caps", calories_target, base, count);
    Ok(count)
}
