//! Planning Tools
//!
//! Structure generation, exchange allocation and the combined day plan.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PlanResult;
use crate::exchange::{ExchangeEngine, MandatoryCategories};
use crate::models::{
    AllocationContext, BehavioralPreferences, ClientSchedule, DailyExchangeAllocation,
    MealStructure, NutritionTargets, TimingAdvisory,
};
use crate::rules::RuleTables;
use crate::structure::MealStructureEngine;

/// Everything needed to plan one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub schedule: ClientSchedule,
    pub targets: NutritionTargets,
    #[serde(default)]
    pub preferences: BehavioralPreferences,
    #[serde(default)]
    pub context: AllocationContext,
    /// Extra timing nudges on top of the dosha advisories
    #[serde(default)]
    pub advisories: Vec<TimingAdvisory>,
    /// Mandatory exchange categories per meal name
    #[serde(default)]
    pub mandatory_categories: MandatoryCategories,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayPlan {
    pub structure: MealStructure,
    pub allocation: DailyExchangeAllocation,
}

/// Build the meal structure for a request
pub fn generate_meal_structure(
    tables: &RuleTables,
    request: &PlanRequest,
) -> PlanResult<MealStructure> {
    MealStructureEngine::new(tables).generate(
        &request.schedule,
        &request.targets,
        &request.preferences,
        &request.context,
        &request.advisories,
    )
}

/// Allocate exchanges against an existing structure
pub fn allocate_exchanges(
    tables: &RuleTables,
    structure: &MealStructure,
    targets: &NutritionTargets,
    mandatory: &MandatoryCategories,
) -> PlanResult<DailyExchangeAllocation> {
    ExchangeEngine::new(tables).allocate(structure, targets, mandatory)
}

/// Structure then allocation
pub fn plan_day(tables: &RuleTables, request: &PlanRequest) -> PlanResult<DayPlan> {
    let structure = generate_meal_structure(tables, request)?;
    let allocation = allocate_exchanges(
        tables,
        &structure,
        &request.targets,
        &request.mandatory_categories,
    )?;
    info!(
        "Planned day: {} meals, {} flags",
        structure.meal_count,
        structure.flags.len() + allocation.flags.len()
    );
    Ok(DayPlan {
        structure,
        allocation,
    })
}
