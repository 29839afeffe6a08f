//! Runtime configuration
//!
//! Read from the environment once at startup.

use std::fmt;
use std::path::PathBuf;

use crate::error::PlanResult;
use crate::rules::RuleTables;

/// Directory holding the rule-table JSON files
pub const RULES_DIR_ENV: &str = "MEALPLAN_RULES_DIR";

/// Where rule tables come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// Snapshot compiled into the binary
    Builtin,
    Directory(PathBuf),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Builtin => f.write_str("built-in"),
            RuleSource::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub rules: RuleSource,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_rules_dir(std::env::var(RULES_DIR_ENV).ok().as_deref())
    }

    /// Blank values fall back to the built-in tables
    pub fn from_rules_dir(dir: Option<&str>) -> Self {
        let rules = match dir.map(str::trim) {
            Some(dir) if !dir.is_empty() => RuleSource::Directory(PathBuf::from(dir)),
            _ => RuleSource::Builtin,
        };
        Self { rules }
    }

    pub fn load_rule_tables(&self) -> PlanResult<RuleTables> {
        match &self.rules {
            RuleSource::Builtin => RuleTables::builtin(),
            RuleSource::Directory(dir) => RuleTables::load_dir(dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_dir_selection() {
        assert_eq!(Settings::from_rules_dir(None).rules, RuleSource::Builtin);
        assert_eq!(Settings::from_rules_dir(Some("  ")).rules, RuleSource::Builtin);
        assert_eq!(
            Settings::from_rules_dir(Some("/etc/mealplan")).rules,
            RuleSource::Directory(PathBuf::from("/etc/mealplan"))
        );
    }

    #[test]
    fn test_load_builtin_and_directory() {
        assert!(Settings::from_rules_dir(None).load_rule_tables().is_ok());

        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data/rules");
        let tables = Settings::from_rules_dir(Some(dir)).load_rule_tables().unwrap();
        assert!(tables.exchange_category("cereal").is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(RuleSource::Builtin.to_string(), "built-in");
    }
}
