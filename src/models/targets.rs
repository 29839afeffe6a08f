//! Daily nutrition targets

use serde::{Deserialize, Serialize};

use super::nutrition::{round_to, Nutrition};
use crate::error::{PlanError, PlanResult};

/// Aggregate daily targets produced upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub target_calories: f64,
    pub target_protein_g: f64,
    #[serde(default)]
    pub target_carbs_g: Option<f64>,
    #[serde(default)]
    pub target_fat_g: Option<f64>,
}

impl NutritionTargets {
    pub fn new(target_calories: f64, target_protein_g: f64) -> Self {
        Self {
            target_calories,
            target_protein_g,
            target_carbs_g: None,
            target_fat_g: None,
        }
    }

    pub fn validate(&self) -> PlanResult<()> {
        if !self.target_calories.is_finite() || self.target_calories <= 0.0 {
            return Err(PlanError::input(format!(
                "target_calories must be > 0, got {}",
                self.target_calories
            )));
        }
        if !self.target_protein_g.is_finite() || self.target_protein_g <= 0.0 {
            return Err(PlanError::input(format!(
                "target_protein_g must be > 0, got {}",
                self.target_protein_g
            )));
        }
        for (field, value) in [
            ("target_carbs_g", self.target_carbs_g),
            ("target_fat_g", self.target_fat_g),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(PlanError::input(format!("{} must be >= 0, got {}", field, v)));
                }
            }
        }
        Ok(())
    }

    /// The share of the day's targets assigned to one meal, rounded to 0.1
    pub fn for_meal(&self, energy_weight: f64) -> Nutrition {
        Nutrition {
            calories: round_to(self.target_calories * energy_weight, 1),
            protein_g: round_to(self.target_protein_g * energy_weight, 1),
            carbs_g: round_to(self.target_carbs_g.unwrap_or(0.0) * energy_weight, 1),
            fat_g: round_to(self.target_fat_g.unwrap_or(0.0) * energy_weight, 1),
        }
    }
}
