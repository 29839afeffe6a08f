//! Energy weight calculation
//!
//! Main meals take their share from the selected allocation rule; what is left goes to
//! snacks or, when there are none, back to the main meals. The result always sums to 1
//! after rounding to two decimals.

use tracing::debug;

use crate::error::{PlanError, PlanResult};
use crate::models::{round_to, AllocationContext, MealKind, MealSlot};
use crate::rules::{CalorieAllocationRule, RedistributionScenario, RuleTables};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightOutcome {
    /// Weight per surviving meal, in scheduling order
    pub weights: Vec<(MealSlot, f64)>,
    /// Snacks dropped by the weight-loss snack cap
    pub pruned: Vec<MealSlot>,
    pub flags: Vec<String>,
}

/// Share each meal's energy weight
pub fn calculate_energy_weights(
    tables: &RuleTables,
    slots: &[MealSlot],
    context: &AllocationContext,
) -> PlanResult<WeightOutcome> {
    let rule = tables
        .calorie_allocation(context)
        .ok_or_else(|| PlanError::config("No calorie allocation rule matches and no default exists"))?;
    debug!("Energy weights from rule '{}'", rule.rule_id);

    let percentages = &rule.meal_type_percentages;
    let mut weights: Vec<f64> = slots
        .iter()
        .map(|s| percentages.weight_for(s.kind).unwrap_or(0.0))
        .collect();
    let mut flags = Vec::new();
    let mut pruned = Vec::new();

    let allocated: f64 = weights.iter().sum();
    let remaining = (1.0 - allocated).max(0.0);
    let snacks: Vec<usize> = (0..slots.len())
        .filter(|&i| slots[i].kind == MealKind::Snack)
        .collect();

    if snacks.is_empty() {
        if remaining > EPSILON {
            redistribute(tables, rule, slots, &mut weights, remaining, RedistributionScenario::NoSnacks)?;
        }
    } else if context.is_weight_loss() {
        let policy = tables.snack_policy(rule)?;
        let effective = snacks.len().min(policy.weight_loss_max_snacks as usize);
        let per_snack = if effective > 0 {
            (remaining / effective as f64).min(policy.weight_loss_max_snack_fraction)
        } else {
            0.0
        };
        for (n, &i) in snacks.iter().enumerate() {
            if n < effective {
                weights[i] = per_snack;
            } else {
                pruned.push(slots[i]);
            }
        }
        if !pruned.is_empty() {
            flags.push(format!("snack_count_capped_{}", effective));
        }
        let surplus = remaining - per_snack * effective as f64;
        if surplus > EPSILON {
            redistribute(
                tables,
                rule,
                slots,
                &mut weights,
                surplus,
                RedistributionScenario::WeightLossSurplus,
            )?;
        }
    } else {
        let per_snack = remaining / snacks.len() as f64;
        for &i in &snacks {
            weights[i] = per_snack;
        }
    }

    let kept: Vec<(MealSlot, f64)> = slots
        .iter()
        .copied()
        .zip(weights)
        .filter(|(slot, _)| !pruned.contains(slot))
        .collect();
    let (weights, fold_flag) = finalize_weights(kept)?;
    flags.extend(fold_flag);

    Ok(WeightOutcome {
        weights,
        pruned,
        flags,
    })
}

/// Push `amount` into the first breakfast, lunch and dinner by the rule's ratios,
/// normalised over the kinds that are actually present
fn redistribute(
    tables: &RuleTables,
    rule: &CalorieAllocationRule,
    slots: &[MealSlot],
    weights: &mut [f64],
    amount: f64,
    scenario: RedistributionScenario,
) -> PlanResult<()> {
    let ratios = tables.redistribution(rule, scenario)?;
    let mut present = Vec::new();
    for kind in [MealKind::Breakfast, MealKind::Lunch, MealKind::Dinner] {
        if slots.iter().any(|s| s.kind == kind) {
            present.push(kind);
        }
    }
    let shares = match ratios.normalized_over(&present) {
        Some(shares) => shares,
        // Nothing to push into; the final renormalisation absorbs it
        None => return Ok(()),
    };
    for (kind, share) in shares {
        if let Some(i) = slots.iter().position(|s| s.kind == kind) {
            weights[i] += amount * share;
        }
    }
    debug!("Redistributed {:.3} by '{}' ratios", amount, scenario.as_str());
    Ok(())
}

/// Renormalise to 1, round to two decimals and fold the rounding residual into the
/// largest meal (the earliest one on a tie)
pub fn finalize_weights(
    weights: Vec<(MealSlot, f64)>,
) -> PlanResult<(Vec<(MealSlot, f64)>, Option<String>)> {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if weights.is_empty() || total <= EPSILON {
        return Err(PlanError::config(
            "Calorie allocation rule leaves no energy for any scheduled meal",
        ));
    }

    let mut rounded: Vec<(MealSlot, f64)> = weights
        .into_iter()
        .map(|(slot, w)| (slot, round_to(w / total, 2)))
        .collect();
    let residual = 1.0 - rounded.iter().map(|(_, w)| w).sum::<f64>();

    let mut flag = None;
    if residual.abs() > EPSILON {
        let mut largest = 0;
        for (i, (_, w)) in rounded.iter().enumerate() {
            if *w > rounded[largest].1 {
                largest = i;
            }
        }
        let (slot, weight) = &mut rounded[largest];
        *weight = round_to(*weight + residual, 2);
        if residual.abs() >= 0.005 {
            flag = Some(format!("rounding_residual_{:.2}_folded_into_{}", residual, slot));
        }
    }
    Ok((rounded, flag))
}
