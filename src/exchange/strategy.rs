//! Declarative weighted allocation
//!
//! A need (grams of protein) is split across an ordered candidate list by fixed
//! shares; whatever the rounded shares leave uncovered goes to the remainder target.

use super::state::{covering_halves, nearest_halves, AllocationState};
use crate::rules::ExchangeCategory;

/// One candidate and the amount of the need it should cover
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub category: &'a ExchangeCategory,
    pub share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainderRule {
    /// Candidate at this index takes any shortfall above tolerance
    AbsorbInto(usize),
}

#[derive(Debug, Clone)]
pub struct WeightedAllocation<'a> {
    pub candidates: Vec<Candidate<'a>>,
    pub remainder: RemainderRule,
    pub tolerance: f64,
}

fn protein(category: &ExchangeCategory) -> f64 {
    category.nutrition_per_exchange.protein_g
}

impl<'a> WeightedAllocation<'a> {
    /// Split a protein need across the `top_n` richest sources, each taking a share
    /// proportional to its protein per exchange. Ties keep the input order. The
    /// richest source absorbs the remainder.
    ///
    /// Returns None when there is no candidate with protein.
    pub fn protein(
        sources: &[&'a ExchangeCategory],
        need: f64,
        top_n: usize,
        tolerance: f64,
    ) -> Option<Self> {
        let mut ranked: Vec<&'a ExchangeCategory> =
            sources.iter().copied().filter(|c| protein(c) > 0.0).collect();
        ranked.sort_by(|a, b| protein(b).total_cmp(&protein(a)));
        ranked.truncate(top_n.max(1));
        if ranked.is_empty() {
            return None;
        }

        let total: f64 = ranked.iter().map(|c| protein(c)).sum();
        let candidates = ranked
            .into_iter()
            .map(|category| Candidate {
                category,
                share: need * protein(category) / total,
            })
            .collect();
        Some(Self {
            candidates,
            remainder: RemainderRule::AbsorbInto(0),
            tolerance,
        })
    }

    /// Apply the shares to a state: each candidate gets its share rounded to the
    /// nearest half-exchange with a half-exchange floor, then the remainder rule runs.
    pub fn apply(&self, mut state: AllocationState<'a>) -> AllocationState<'a> {
        let mut covered = 0.0;
        for candidate in &self.candidates {
            let per = protein(candidate.category);
            let halves = nearest_halves(candidate.share / per).max(1);
            covered += halves as f64 / 2.0 * per;
            state = state.with_added(candidate.category.id(), halves);
        }

        let total_need: f64 = self.candidates.iter().map(|c| c.share).sum();
        let shortfall = total_need - covered;
        if shortfall > self.tolerance {
            let RemainderRule::AbsorbInto(index) = self.remainder;
            if let Some(target) = self.candidates.get(index) {
                let halves = covering_halves(shortfall, protein(target.category), self.tolerance);
                state = state.with_added(target.category.id(), halves);
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrition;

    fn category(id: &str, calories: f64, protein_g: f64) -> ExchangeCategory {
        ExchangeCategory {
            exchange_category_id: id.to_string(),
            display_name: None,
            amount_per_exchange_g: 30.0,
            nutrition_per_exchange: Nutrition {
                calories,
                protein_g,
                carbs_g: 0.0,
                fat_g: 0.0,
            },
        }
    }

    #[test]
    fn test_single_candidate_takes_all() {
        let pulse = category("pulse", 100.0, 7.0);
        let plan = WeightedAllocation::protein(&[&pulse], 15.5, 3, 2.0).unwrap();
        assert_eq!(plan.candidates.len(), 1);
        assert!((plan.candidates[0].share - 15.5).abs() < 1e-9);
        let state = plan.apply(AllocationState::with_floor(&[&pulse], 1));
        // 15.5 / 7 = 2.21 -> 2.0 more, shortfall 1.5 g is within tolerance
        assert!((state.count("pulse") - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_top_n_by_protein_with_stable_ties() {
        let milk = category("milk", 100.0, 6.0);
        let paneer = category("paneer", 90.0, 6.0);
        let egg = category("egg_whites", 35.0, 7.0);
        let pulse = category("pulse", 100.0, 7.0);
        let plan =
            WeightedAllocation::protein(&[&milk, &paneer, &egg, &pulse], 26.0, 3, 2.0).unwrap();
        let ids: Vec<_> = plan.candidates.iter().map(|c| c.category.id()).collect();
        assert_eq!(ids, vec!["egg_whites", "pulse", "milk"]);
        assert!((plan.candidates[0].share - 26.0 * 7.0 / 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_remainder_absorbed_by_richest() {
        let egg = category("egg_whites", 35.0, 7.0);
        let milk = category("milk", 100.0, 6.0);
        let plan = WeightedAllocation::protein(&[&milk, &egg], 40.0, 3, 2.0).unwrap();
        let state = plan.apply(AllocationState::with_floor(&[&milk, &egg], 0));
        let protein = state.nutrition().protein_g;
        assert!(protein >= 40.0 - 2.0, "only {} g covered", protein);
    }

    #[test]
    fn test_no_protein_candidates() {
        let fat = category("fat", 45.0, 0.0);
        assert!(WeightedAllocation::protein(&[&fat], 10.0, 3, 2.0).is_none());
    }
}
