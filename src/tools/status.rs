//! Meal Plan Status Tool
//!
//! Provides runtime status information about the meal plan service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::RuleSource;
use crate::rules::RuleTables;

/// Runtime status of the meal plan service
#[derive(Debug, Clone, Serialize)]
pub struct MealPlanStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Rule table information
    pub rule_source: String,
    pub exchange_categories: usize,
    pub allocation_rules: usize,

    /// Process information
    pub started_at: String,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: DateTime<Utc>,
    rule_source: RuleSource,
}

impl StatusTracker {
    pub fn new(rule_source: RuleSource) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            rule_source,
        }
    }

    /// Get the current status
    pub fn get_status(&self, tables: &RuleTables) -> MealPlanStatus {
        let build_info = BuildInfo::current();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MealPlanStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            rule_source: self.rule_source.to_string(),
            exchange_categories: tables.exchange_categories().len(),
            allocation_rules: tables.calorie_allocation_rules().len(),
            started_at: self.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_tables() {
        let tables = RuleTables::builtin().unwrap();
        let tracker = StatusTracker::new(RuleSource::Builtin);
        let status = tracker.get_status(&tables);
        assert_eq!(status.rule_source, "built-in");
        assert_eq!(status.exchange_categories, tables.exchange_categories().len());
        assert_eq!(status.process_id, std::process::id());
        assert!(status.started_at.ends_with("UTC"));
    }
}
