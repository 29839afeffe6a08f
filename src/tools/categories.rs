//! Exchange category listing

use serde::Serialize;

use crate::exchange::{AllocationPolicy, CategoryClass};
use crate::models::{round_to, Nutrition};
use crate::rules::RuleTables;

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeCategorySummary {
    pub id: String,
    pub display_name: String,
    pub amount_per_exchange_g: f64,
    pub nutrition_per_exchange: Nutrition,
    pub protein_per_kcal: Option<f64>,
    pub class: CategoryClass,
}

/// All exchange categories in table order, classified under the given policy
pub fn list_exchange_categories(
    tables: &RuleTables,
    policy: &AllocationPolicy,
) -> Vec<ExchangeCategorySummary> {
    tables
        .exchange_categories()
        .iter()
        .map(|c| ExchangeCategorySummary {
            id: c.id().to_string(),
            display_name: c.display_name().to_string(),
            amount_per_exchange_g: c.amount_per_exchange_g,
            nutrition_per_exchange: c.nutrition_per_exchange,
            protein_per_kcal: c
                .nutrition_per_exchange
                .protein_density()
                .map(|d| round_to(d, 3)),
            class: CategoryClass::of(c, policy),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_matches_tables() {
        let tables = RuleTables::builtin().unwrap();
        let list = list_exchange_categories(&tables, &AllocationPolicy::default());
        assert_eq!(list.len(), tables.exchange_categories().len());

        let pulse = list.iter().find(|c| c.id == "pulse").unwrap();
        assert_eq!(pulse.class, CategoryClass::ProteinRich);
        let cereal = list.iter().find(|c| c.id == "cereal").unwrap();
        assert_eq!(cereal.class, CategoryClass::CalorieRich);
    }
}
