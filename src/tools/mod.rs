//! Meal Plan Tools module
//!
//! Tool implementations behind the MCP server and the plan-day binary.

pub mod categories;
pub mod planning;
pub mod status;
