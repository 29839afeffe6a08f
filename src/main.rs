//! Meal Plan Core
//!
//! An MCP server for daily meal structure and food exchange allocation.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use mealplan::build_info;
use mealplan::config::{Settings, RULES_DIR_ENV};
use mealplan::mcp::MealPlanService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mealplan=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    // Rule tables are loaded once and shared read-only
    let settings = Settings::from_env();
    eprintln!("Rule tables: {} (set {} to override)", settings.rules, RULES_DIR_ENV);
    let tables = settings.load_rule_tables()?;

    let service = MealPlanService::new(tables, settings.rules);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
