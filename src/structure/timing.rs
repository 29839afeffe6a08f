//! Meal timing windows
//!
//! Every window is computed in minutes since wake, so a day that runs past midnight
//! needs no special handling.

use tracing::{debug, warn};

use crate::error::{PlanError, PlanResult};
use crate::models::{MealKind, MealSlot};
use crate::rules::{RuleTables, TimingFormula};
use crate::timing::{DayFrame, Offset, Span};

/// A meal slot with its placed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMeal {
    pub slot: MealSlot,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct TimingOutcome {
    /// Placed meals in scheduling order
    pub meals: Vec<TimedMeal>,
    pub flags: Vec<String>,
}

/// Place each meal in order, each one relative to wake, the previous meal or sleep.
///
/// Sleep-relative meals of the same kind are placed back to back, the last one ending
/// at the buffer before sleep.
pub fn calculate_timing_windows(
    tables: &RuleTables,
    slots: &[MealSlot],
    frame: &DayFrame,
) -> PlanResult<TimingOutcome> {
    let thresholds = tables.thresholds();
    let mut outcome = TimingOutcome::default();

    for (i, slot) in slots.iter().enumerate() {
        let formula = tables.timing_rule(slot.kind).ok_or_else(|| {
            PlanError::config(format!("No timing rule for meal type '{}'", slot.kind.as_str()))
        })?;
        let previous_end: Option<Offset> = outcome.meals.last().map(|m| m.span.end);

        let placed = match *formula {
            TimingFormula::RelativeToWake { start, end } => Some(Span::new(start, end)),

            TimingFormula::RelativeToPreviousMeal {
                start,
                end,
                duration,
                wake_fallback,
            } => {
                let span = match (previous_end, wake_fallback) {
                    (Some(anchor), _) => Span::new(anchor + start, anchor + end),
                    (None, Some((fb_start, fb_end))) => Span::new(fb_start, fb_end),
                    (None, None) => Span::new(start, end),
                };
                if slot.kind == MealKind::Snack {
                    let limit = frame.latest_end(thresholds.snack_buffer_minutes());
                    pull_before(span, limit, duration, previous_end.unwrap_or(0))
                } else {
                    Some(span)
                }
            }

            TimingFormula::RelativeToSleep {
                buffer,
                duration,
                min_gap,
            } => {
                // The last slot of this kind sits against the buffer; earlier ones are
                // stacked back from it, one window and one gap each
                let stacked = slots[i + 1..].iter().filter(|s| s.kind == slot.kind).count() as i32;
                let limit = frame.latest_end(buffer.max(thresholds.dinner_buffer_minutes()))
                    - stacked * (duration + min_gap);
                let mut span = Span::ending_at(limit, duration);
                if let Some(prev) = previous_end {
                    let earliest = prev + min_gap;
                    if span.start < earliest {
                        // Start after the previous meal and compress toward the buffer
                        span = Span::new(earliest, (earliest + duration).min(limit));
                    }
                }
                if span.is_empty() || span.start < 0 {
                    None
                } else {
                    Some(span)
                }
            }
        };

        match placed {
            Some(span) => {
                debug!(
                    "{} placed at {}-{}",
                    slot,
                    frame.clock_at(span.start),
                    frame.clock_at(span.end)
                );
                outcome.meals.push(TimedMeal { slot: *slot, span });
            }
            None => {
                warn!("No room for {} before sleep; dropping it", slot);
                outcome
                    .flags
                    .push(format!("{}_dropped_no_room_before_sleep", slot));
            }
        }
    }

    Ok(outcome)
}

/// Pull a window that ends past `limit` back so it ends exactly there.
///
/// Returns None if the pulled window would start before `not_before`.
fn pull_before(span: Span, limit: Offset, duration: Option<i32>, not_before: Offset) -> Option<Span> {
    if span.end <= limit {
        return Some(span);
    }
    let pulled = Span::ending_at(limit, duration.unwrap_or_else(|| span.duration()));
    if pulled.start < not_before {
        None
    } else {
        Some(pulled)
    }
}

/// Re-clip every window against its buffer before sleep: dinner meals use the dinner
/// buffer, everything else the snack buffer. Clipping only shortens a window; one
/// that vanishes is dropped and flagged.
pub fn clip_to_buffers(
    tables: &RuleTables,
    frame: &DayFrame,
    meals: Vec<TimedMeal>,
    flags: &mut Vec<String>,
) -> Vec<TimedMeal> {
    let thresholds = tables.thresholds();
    meals
        .into_iter()
        .filter_map(|meal| {
            let limit = frame.latest_end(thresholds.buffer_minutes_for(meal.slot.kind));
            match meal.span.clipped_to(limit) {
                Some(span) => {
                    if span != meal.span {
                        debug!("{} clipped to end at {}", meal.slot, frame.clock_at(span.end));
                    }
                    Some(TimedMeal { span, ..meal })
                }
                None => {
                    warn!("{} falls inside the sleep buffer; dropping it", meal.slot);
                    flags.push(format!("{}_dropped_too_close_to_sleep", meal.slot));
                    None
                }
            }
        })
        .collect()
}
