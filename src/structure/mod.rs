//! Meal Structure Engine
//!
//! Decides how many meals a client eats, what they are called, when they happen and
//! what share of the day's energy each one carries.

mod engine;
mod meal_count;
mod meal_names;
mod nudges;
mod timing;
mod validate;
mod weights;

pub use engine::MealStructureEngine;
pub use meal_count::determine_meal_count;
pub use meal_names::{assign_meal_names, MealNames};
pub use nudges::apply_advisories;
pub use timing::{calculate_timing_windows, clip_to_buffers, TimedMeal, TimingOutcome};
pub use validate::validate_structure;
pub use weights::{calculate_energy_weights, finalize_weights, WeightOutcome};
