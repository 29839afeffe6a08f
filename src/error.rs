//! Error types
//!
//! Configuration and input errors abort a run. Structural problems found after a
//! structure or allocation is built are reported as flags on the result instead.

use std::path::PathBuf;

use thiserror::Error;

/// Planning error types
#[derive(Debug, Error)]
pub enum PlanError {
    /// Missing or malformed rule-table entry
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read rule table {path}: {source}")]
    RuleTableRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rule table {table}: {source}")]
    RuleTableParse {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    /// Missing or invalid schedule, preference or target field
    #[error("Invalid input: {0}")]
    InputValidation(String),
}

impl PlanError {
    pub fn config(msg: impl Into<String>) -> Self {
        PlanError::Configuration(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        PlanError::InputValidation(msg.into())
    }

    /// True for every error caused by rule-table data rather than caller input
    pub fn is_configuration(&self) -> bool {
        !matches!(self, PlanError::InputValidation(_))
    }
}

/// Result type for planning operations
pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(PlanError::config("missing dinner rule").is_configuration());
        assert!(!PlanError::input("wake_time is required").is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = PlanError::input("target_calories must be > 0");
        assert_eq!(err.to_string(), "Invalid input: target_calories must be > 0");
    }
}
