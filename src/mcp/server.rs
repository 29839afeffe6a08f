//! Meal Plan MCP Server Implementation
//!
//! Exposes the structure and exchange engines as MCP tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::RuleSource;
use crate::error::PlanError;
use crate::exchange::{AllocationPolicy, MandatoryCategories};
use crate::models::{
    AllocationContext, BehavioralPreferences, ClientSchedule, MealStructure, NutritionTargets,
    TimingAdvisory,
};
use crate::rules::RuleTables;
use crate::tools::categories;
use crate::tools::planning::{self, PlanRequest};
use crate::tools::status::StatusTracker;

/// Meal Plan MCP Service
#[derive(Clone)]
pub struct MealPlanService {
    tables: Arc<RuleTables>,
    status_tracker: Arc<Mutex<StatusTracker>>,
    tool_router: ToolRouter<MealPlanService>,
}

impl MealPlanService {
    pub fn new(tables: RuleTables, rule_source: RuleSource) -> Self {
        Self {
            tables: Arc::new(tables),
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(rule_source))),
            tool_router: Self::tool_router(),
        }
    }
}

/// Rule-table problems are server faults; everything else is the caller's input
fn to_mcp_error(e: PlanError) -> McpError {
    if e.is_configuration() {
        McpError::internal_error(e.to_string(), None)
    } else {
        McpError::invalid_params(e.to_string(), None)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateMealStructureParams {
    /// Wake time, HH:MM 24-hour
    pub wake_time: String,
    /// Sleep time, HH:MM 24-hour (may be after midnight)
    pub sleep_time: String,
    pub target_calories: f64,
    pub target_protein_g: f64,
    pub target_carbs_g: Option<f64>,
    pub target_fat_g: Option<f64>,
    /// Requested meal count, 1-7
    pub explicit_meal_count: Option<u8>,
    /// Fasting pattern "fasting:eating", e.g. "16:8"
    pub fasting_window: Option<String>,
    #[serde(default)]
    pub snack_preference: bool,
    #[serde(default = "default_max_meals")]
    pub max_meals: u8,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    pub primary_goal: Option<String>,
    #[serde(default)]
    pub secondary_goals: Vec<String>,
    pub activity_level: Option<String>,
    #[serde(default)]
    pub imbalanced_doshas: Vec<String>,
    /// Extra nudges: {"kind": "avoid_after", "not_after": "19:00"} or
    /// {"kind": "avoid_interval", "start": "22:00", "end": "02:00"}
    #[serde(default)]
    pub advisories: Vec<serde_json::Value>,
}

fn default_max_meals() -> u8 { 6 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlanDayParams {
    #[serde(flatten)]
    pub client: GenerateMealStructureParams,
    /// Mandatory exchange category ids per meal name
    #[serde(default)]
    pub mandatory_categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AllocateExchangesParams {
    /// Meal names in scheduling order
    pub meals: Vec<String>,
    /// Energy share per meal; should sum to 1.0
    pub energy_weight: BTreeMap<String, f64>,
    pub target_calories: f64,
    pub target_protein_g: f64,
    pub target_carbs_g: Option<f64>,
    pub target_fat_g: Option<f64>,
    /// Mandatory exchange category ids per meal name
    #[serde(default)]
    pub mandatory_categories: BTreeMap<String, Vec<String>>,
}

impl GenerateMealStructureParams {
    fn into_request(self, mandatory_categories: MandatoryCategories) -> Result<PlanRequest, McpError> {
        let advisories = self
            .advisories
            .into_iter()
            .map(serde_json::from_value::<TimingAdvisory>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| McpError::invalid_params(format!("Invalid advisory: {}", e), None))?;
        Ok(PlanRequest {
            schedule: ClientSchedule {
                wake_time: Some(self.wake_time),
                sleep_time: Some(self.sleep_time),
                work_schedule: None,
            },
            targets: NutritionTargets {
                target_calories: self.target_calories,
                target_protein_g: self.target_protein_g,
                target_carbs_g: self.target_carbs_g,
                target_fat_g: self.target_fat_g,
            },
            preferences: BehavioralPreferences {
                explicit_meal_count: self.explicit_meal_count,
                fasting_window: self.fasting_window,
                snack_preference: self.snack_preference,
                max_meals: self.max_meals,
            },
            context: AllocationContext {
                medical_conditions: self.medical_conditions,
                primary_goal: self.primary_goal,
                secondary_goals: self.secondary_goals,
                activity_level: self.activity_level,
                imbalanced_doshas: self.imbalanced_doshas,
            },
            advisories,
            mandatory_categories,
        })
    }
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MealPlanService {
    #[tool(description = "Get the current status of the meal plan service including build info, rule tables, and process information")]
    async fn mealplan_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.tables);
        to_json(&status)
    }

    #[tool(description = "List the food exchange categories with their per-exchange nutrition and protein/calorie classification")]
    fn list_exchange_categories(&self) -> Result<CallToolResult, McpError> {
        let result = categories::list_exchange_categories(&self.tables, &AllocationPolicy::default());
        to_json(&result)
    }

    #[tool(description = "Generate the daily meal structure: meal count, meal names, timing windows, and energy weight per meal")]
    fn generate_meal_structure(&self, Parameters(p): Parameters<GenerateMealStructureParams>) -> Result<CallToolResult, McpError> {
        let request = p.into_request(MandatoryCategories::new())?;
        let result = planning::generate_meal_structure(&self.tables, &request).map_err(to_mcp_error)?;
        to_json(&result)
    }

    #[tool(description = "Allocate food exchanges for each meal of an existing meal structure from its energy weights and the daily targets")]
    fn allocate_exchanges(&self, Parameters(p): Parameters<AllocateExchangesParams>) -> Result<CallToolResult, McpError> {
        let structure = MealStructure {
            meal_count: p.meals.len(),
            meals: p.meals,
            timing_windows: BTreeMap::new(),
            energy_weight: p.energy_weight,
            flags: Vec::new(),
        };
        let targets = NutritionTargets {
            target_calories: p.target_calories,
            target_protein_g: p.target_protein_g,
            target_carbs_g: p.target_carbs_g,
            target_fat_g: p.target_fat_g,
        };
        let result = planning::allocate_exchanges(&self.tables, &structure, &targets, &p.mandatory_categories)
            .map_err(to_mcp_error)?;
        to_json(&result)
    }

    #[tool(description = "Plan a full day: generate the meal structure, then allocate exchanges for each meal from its mandatory categories")]
    fn plan_day(&self, Parameters(p): Parameters<PlanDayParams>) -> Result<CallToolResult, McpError> {
        let request = p.client.into_request(p.mandatory_categories)?;
        let result = planning::plan_day(&self.tables, &request).map_err(to_mcp_error)?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for MealPlanService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mealplan".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Meal Plan Core".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Meal Plan Core - daily meal structure and food exchange allocation. \
                 generate_meal_structure: meals, timing windows and energy weights from schedule, targets and preferences. \
                 allocate_exchanges: per-meal exchange counts for an existing structure. \
                 plan_day: both steps in one call. \
                 list_exchange_categories: available category ids for mandatory_categories. \
                 Results carry a flags list describing every adjustment made."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerateMealStructureParams {
        serde_json::from_value(serde_json::json!({
            "wake_time": "07:00",
            "sleep_time": "22:00",
            "target_calories": 1800,
            "target_protein_g": 80,
            "advisories": [{"kind": "avoid_after", "not_after": "19:00"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_params_into_request() {
        let request = params().into_request(MandatoryCategories::new()).unwrap();
        assert_eq!(request.preferences.max_meals, 6);
        assert_eq!(request.advisories.len(), 1);
        assert_eq!(request.schedule.wake_time.as_deref(), Some("07:00"));
    }

    #[test]
    fn test_bad_advisory_rejected() {
        let mut p = params();
        p.advisories = vec![serde_json::json!({"kind": "avoid_lunch"})];
        assert!(p.into_request(MandatoryCategories::new()).is_err());
    }

    #[test]
    fn test_plan_day_params_flatten() {
        let p: PlanDayParams = serde_json::from_value(serde_json::json!({
            "wake_time": "07:00",
            "sleep_time": "22:00",
            "target_calories": 1800,
            "target_protein_g": 80,
            "mandatory_categories": {"breakfast": ["cereal"]}
        }))
        .unwrap();
        assert_eq!(p.client.wake_time, "07:00");
        assert_eq!(p.mandatory_categories["breakfast"], vec!["cereal"]);
    }

    #[test]
    fn test_unknown_category_is_invalid_params() {
        let tables = RuleTables::builtin().unwrap();
        let service = MealPlanService::new(tables, RuleSource::Builtin);
        let p: PlanDayParams = serde_json::from_value(serde_json::json!({
            "wake_time": "07:00",
            "sleep_time": "22:00",
            "target_calories": 1800,
            "target_protein_g": 80,
            "mandatory_categories": {"breakfast": ["cerael"]}
        }))
        .unwrap();
        let err = service.plan_day(Parameters(p)).unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_error_mapping() {
        let tables = RuleTables::builtin().unwrap();
        let service = MealPlanService::new(tables, RuleSource::Builtin);
        let mut p = params();
        p.wake_time = "25:00".into();
        let err = service.generate_meal_structure(Parameters(p)).unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }
}
