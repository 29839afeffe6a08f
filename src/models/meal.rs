//! Meal kinds and meal slot identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Meal type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealKind::Breakfast => "breakfast",
            MealKind::Lunch => "lunch",
            MealKind::Dinner => "dinner",
            MealKind::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Some(MealKind::Breakfast),
            "lunch" => Some(MealKind::Lunch),
            "dinner" => Some(MealKind::Dinner),
            "snack" => Some(MealKind::Snack),
            _ => None,
        }
    }

    /// Classify a meal identifier such as "lunch2" or "snack3"
    pub fn of_meal(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        [
            MealKind::Breakfast,
            MealKind::Lunch,
            MealKind::Dinner,
            MealKind::Snack,
        ]
        .into_iter()
        .find(|kind| lower.contains(kind.as_str()))
    }
}

/// One meal position in the day, e.g. `lunch2` or `snack1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MealSlot {
    pub kind: MealKind,
    /// 1-based position among meals of the same kind
    pub ordinal: u8,
}

impl MealSlot {
    pub fn new(kind: MealKind, ordinal: u8) -> Self {
        Self { kind, ordinal }
    }

    pub fn first(kind: MealKind) -> Self {
        Self::new(kind, 1)
    }

    /// Identifier used as the key in structure and allocation maps
    pub fn name(&self) -> String {
        match (self.kind, self.ordinal) {
            (MealKind::Snack, n) => format!("snack{}", n),
            (kind, 1) => kind.as_str().to_string(),
            (kind, n) => format!("{}{}", kind.as_str(), n),
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_names() {
        assert_eq!(MealSlot::first(MealKind::Breakfast).name(), "breakfast");
        assert_eq!(MealSlot::new(MealKind::Lunch, 2).name(), "lunch2");
        assert_eq!(MealSlot::first(MealKind::Snack).name(), "snack1");
        assert_eq!(MealSlot::new(MealKind::Snack, 3).to_string(), "snack3");
    }

    #[test]
    fn test_of_meal() {
        assert_eq!(MealKind::of_meal("dinner2"), Some(MealKind::Dinner));
        assert_eq!(MealKind::of_meal("Snack1"), Some(MealKind::Snack));
        assert_eq!(MealKind::of_meal("brunch"), None);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [MealKind::Breakfast, MealKind::Lunch, MealKind::Dinner, MealKind::Snack] {
            assert_eq!(MealKind::from_str(kind.as_str()), Some(kind));
        }
    }
}
