//! Exchange Allocation Engine
//!
//! Converts each meal's share of the daily targets into food-exchange counts drawn
//! only from that meal's mandatory categories.

mod engine;
mod phases;
mod state;
mod strategy;

pub use engine::{ExchangeEngine, MandatoryCategories};
pub use phases::{fill_calories, fill_protein, floor, AllocationPolicy, CategoryClass};
pub use state::{covering_halves, nearest_halves, AllocationState};
pub use strategy::{Candidate, RemainderRule, WeightedAllocation};
