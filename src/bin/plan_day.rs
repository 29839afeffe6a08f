//! Plan one day from a request file and print the plan as JSON
//!
//! Usage: plan-day <request.json>

use std::path::PathBuf;

use mealplan::config::Settings;
use mealplan::tools::planning::{plan_day, PlanRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            eprintln!("Usage: plan-day <request.json>");
            std::process::exit(2);
        }
    };

    let settings = Settings::from_env();
    eprintln!("Rule tables: {}", settings.rules);
    let tables = settings.load_rule_tables()?;

    let request: PlanRequest = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let plan = plan_day(&tables, &request)?;

    for flag in plan.structure.flags.iter().chain(&plan.allocation.flags) {
        eprintln!("flag: {}", flag);
    }
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}
