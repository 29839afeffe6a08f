//! Shared nutrition data structure
//!
//! Used for per-exchange reference values, per-meal targets and reconstructed totals.

use serde::{Deserialize, Serialize};

/// Energy and macronutrient amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

impl Nutrition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein_g: self.protein_g * multiplier,
            carbs_g: self.carbs_g * multiplier,
            fat_g: self.fat_g * multiplier,
        }
    }

    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
        }
    }

    /// Round every field to one decimal place for reporting
    pub fn rounded(&self) -> Self {
        Self {
            calories: round_to(self.calories, 1),
            protein_g: round_to(self.protein_g, 1),
            carbs_g: round_to(self.carbs_g, 1),
            fat_g: round_to(self.fat_g, 1),
        }
    }

    /// Protein grams per kcal; zero-calorie entries have no density
    pub fn protein_density(&self) -> Option<f64> {
        if self.calories > 0.0 {
            Some(self.protein_g / self.calories)
        } else {
            None
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

/// Round half away from zero to the given number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_sum() {
        let pulse = Nutrition {
            calories: 100.0,
            protein_g: 7.0,
            carbs_g: 15.0,
            fat_g: 0.5,
        };
        let total: Nutrition = vec![pulse * 1.5, pulse * 0.5].into_iter().sum();
        assert!((total.calories - 200.0).abs() < 1e-9);
        assert!((total.protein_g - 14.0).abs() < 1e-9);
        assert!((total.fat_g - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_protein_density() {
        let egg = Nutrition {
            calories: 35.0,
            protein_g: 7.0,
            ..Nutrition::zero()
        };
        assert!((egg.protein_density().unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(Nutrition::zero().protein_density(), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.126, 2), 0.13);
        assert_eq!(round_to(449.96, 1), 450.0);
    }
}
