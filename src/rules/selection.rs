//! Context-based calorie-allocation rule selection

use tracing::debug;

use super::tables::CalorieAllocationRule;
use crate::models::AllocationContext;

fn term_matches(term: &str, target: &str) -> bool {
    let target = target.trim().to_lowercase();
    !target.is_empty() && (term == target || term.contains(&target) || target.contains(term))
}

/// Pick the allocation rule for a client context.
///
/// Terms are tried in priority order (conditions, then goals, then activity level),
/// and for each term the non-default rules in table order. The first rule whose
/// `applies_to` matches wins; otherwise the default rule is used.
pub fn select_rule<'a>(
    rules: &'a [CalorieAllocationRule],
    context: &AllocationContext,
) -> Option<&'a CalorieAllocationRule> {
    for term in context.match_terms() {
        let matched = rules
            .iter()
            .filter(|r| !r.is_default)
            .find(|r| r.applies_to.iter().any(|target| term_matches(&term, target)));
        if let Some(rule) = matched {
            debug!("Allocation rule '{}' selected by term '{}'", rule.rule_id, term);
            return Some(rule);
        }
    }
    rules.iter().find(|r| r.is_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<CalorieAllocationRule> {
        serde_json::from_str(
            r#"[
                {"rule_id": "default", "is_default": true,
                 "meal_type_percentages": {"breakfast": 25, "lunch": 35, "dinner": 30}},
                {"rule_id": "glycemic", "applies_to": ["diabetes", "prediabetes"],
                 "meal_type_percentages": {"breakfast": 25, "lunch": 30, "dinner": 25}},
                {"rule_id": "weight", "applies_to": ["weight_loss"],
                 "meal_type_percentages": {"breakfast": 30, "lunch": 35, "dinner": 25}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let rules = rules();
        let rule = select_rule(&rules, &AllocationContext::default()).unwrap();
        assert_eq!(rule.rule_id, "default");
    }

    #[test]
    fn test_conditions_outrank_goals() {
        let rules = rules();
        let ctx = AllocationContext {
            medical_conditions: vec!["Type 2 Diabetes".to_string()],
            primary_goal: Some("weight_loss".to_string()),
            ..Default::default()
        };
        assert_eq!(select_rule(&rules, &ctx).unwrap().rule_id, "glycemic");
    }

    #[test]
    fn test_goal_match() {
        let rules = rules();
        let ctx = AllocationContext {
            primary_goal: Some("weight_loss".to_string()),
            ..Default::default()
        };
        assert_eq!(select_rule(&rules, &ctx).unwrap().rule_id, "weight");
    }
}
