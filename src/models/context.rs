//! Client context used to select calorie-allocation rules

use serde::{Deserialize, Serialize};

pub const WEIGHT_LOSS_GOAL: &str = "weight_loss";

/// Goals and clinical context from the assessment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationContext {
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub primary_goal: Option<String>,
    #[serde(default)]
    pub secondary_goals: Vec<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
    /// Imbalanced doshas from the ayurveda assessment, e.g. "kapha"
    #[serde(default)]
    pub imbalanced_doshas: Vec<String>,
}

impl AllocationContext {
    pub fn is_weight_loss(&self) -> bool {
        self.primary_goal
            .as_deref()
            .map(|g| g.trim().eq_ignore_ascii_case(WEIGHT_LOSS_GOAL))
            .unwrap_or(false)
    }

    /// Lower-cased terms in priority order: conditions, goals, activity level
    pub fn match_terms(&self) -> Vec<String> {
        self.medical_conditions
            .iter()
            .chain(self.primary_goal.iter())
            .chain(self.secondary_goals.iter())
            .chain(self.activity_level.iter())
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_terms_order() {
        let ctx = AllocationContext {
            medical_conditions: vec!["Type_2_Diabetes".to_string()],
            primary_goal: Some("weight_loss".to_string()),
            secondary_goals: vec!["".to_string()],
            activity_level: Some("very_active".to_string()),
            imbalanced_doshas: vec![],
        };
        assert_eq!(
            ctx.match_terms(),
            vec!["type_2_diabetes", "weight_loss", "very_active"]
        );
        assert!(ctx.is_weight_loss());
    }

    #[test]
    fn test_default_is_not_weight_loss() {
        assert!(!AllocationContext::default().is_weight_loss());
    }
}
