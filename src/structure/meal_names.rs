//! Meal naming

use tracing::warn;

use crate::models::{BehavioralPreferences, MealKind, MealSlot};

/// Ordered meal slots plus any adjustment flags
#[derive(Debug, Clone, PartialEq)]
pub struct MealNames {
    pub slots: Vec<MealSlot>,
    pub flags: Vec<String>,
}

/// Name the meals of the day in scheduling order.
///
/// Breakfast, lunch and dinner come first. Extra slots become snacks when the client
/// likes snacking; otherwise a second lunch and a second dinner, and nothing beyond that.
pub fn assign_meal_names(count: usize, prefs: &BehavioralPreferences) -> MealNames {
    let mut slots = vec![MealSlot::first(MealKind::Breakfast)];
    let mut flags = Vec::new();
    if count >= 2 {
        slots.push(MealSlot::first(MealKind::Lunch));
    }
    if count >= 3 {
        slots.push(MealSlot::first(MealKind::Dinner));
    }

    let extra = count.saturating_sub(3);
    if prefs.snack_preference {
        slots.extend((1..=extra).map(|n| MealSlot::new(MealKind::Snack, n as u8)));
    } else {
        if extra >= 1 {
            slots.insert(2, MealSlot::new(MealKind::Lunch, 2));
        }
        if extra >= 2 {
            slots.push(MealSlot::new(MealKind::Dinner, 2));
        }
        if extra > 2 {
            warn!("{} meals requested without snacks; only {} can be named", count, slots.len());
            flags.push(format!("meal_count_reduced_from_{}", count));
        }
    }

    MealNames { slots, flags }
}
