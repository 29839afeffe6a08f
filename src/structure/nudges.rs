//! Advisory timing nudges
//!
//! Nudges are secondary to the core timing rules. A nudge is applied only when the
//! moved window still sits between its neighbours and ends inside its sleep buffer;
//! otherwise the window is left alone and the skip is flagged.

use tracing::{debug, warn};

use super::timing::TimedMeal;
use crate::models::TimingAdvisory;
use crate::rules::ValidationThresholds;
use crate::timing::{clock_interval_spans, DayFrame, Span};

/// Where an advisory would like a window to be, if it needs to move at all
fn nudge_target(frame: &DayFrame, advisory: &TimingAdvisory, span: Span) -> Option<Span> {
    match *advisory {
        TimingAdvisory::AvoidAfter { not_after } => {
            let cutoff = frame.offset_of(not_after);
            if span.start >= cutoff {
                Some(Span::ending_at(cutoff, span.duration()))
            } else {
                None
            }
        }
        TimingAdvisory::AvoidInterval { start, end } => clock_interval_spans(frame, start, end)
            .into_iter()
            .find(|interval| !interval.is_empty() && span.overlaps(interval))
            .map(|interval| {
                if span.start >= interval.start {
                    Span::starting_at(interval.end, span.duration())
                } else {
                    Span::ending_at(interval.start, span.duration())
                }
            }),
    }
}

/// Apply advisories in order to every meal they cover
pub fn apply_advisories(
    frame: &DayFrame,
    thresholds: &ValidationThresholds,
    meals: &mut [TimedMeal],
    advisories: &[TimingAdvisory],
    flags: &mut Vec<String>,
) {
    for advisory in advisories {
        for i in 0..meals.len() {
            let meal = meals[i];
            if !advisory.applies_to(meal.slot.kind) {
                continue;
            }
            let target = match nudge_target(frame, advisory, meal.span) {
                Some(target) => target,
                None => continue,
            };

            let not_before = if i == 0 { 0 } else { meals[i - 1].span.end };
            let limit = frame.latest_end(thresholds.buffer_minutes_for(meal.slot.kind));
            let not_after = meals
                .get(i + 1)
                .map(|next| next.span.start.min(limit))
                .unwrap_or(limit);

            if target.start >= not_before && target.end <= not_after {
                debug!(
                    "{} moved to {}-{} ({})",
                    meal.slot,
                    frame.clock_at(target.start),
                    frame.clock_at(target.end),
                    advisory.label()
                );
                meals[i].span = target;
            } else {
                warn!(
                    "Skipping {} for {}: the move would overlap another meal or the sleep buffer",
                    advisory.label(),
                    meal.slot
                );
                let flag = format!("advisory_nudge_skipped_{}_{}", meal.slot, advisory.label());
                if !flags.contains(&flag) {
                    flags.push(flag);
                }
            }
        }
    }
}
