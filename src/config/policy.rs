//! Compliance policy rule configuration.
//!
//! Rules are declared in TOML and compiled into [`PolicyRule`]s once at
//! startup; an unparseable pattern or bound is a fatal configuration error.

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{OperationType, PolicyRule, Predicate, Severity};
use crate::error::ConfigError;

/// Compliance section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl ComplianceConfig {
    /// Compile the declared rules into the immutable process ruleset.
    pub fn compile(&self) -> Result<Vec<PolicyRule>, ConfigError> {
        self.rules.iter().map(RuleConfig::compile).collect()
    }
}

/// One declared rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    pub predicate: PredicateConfig,
}

fn default_severity() -> Severity {
    Severity::Blocking
}

/// Declarative predicate forms accepted in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredicateConfig {
    RequireField { field: String },
    FieldMax { field: String, max: Decimal },
    FieldPattern { field: String, pattern: String },
    DeniedCallers { callers: Vec<String> },
    AllowedOperations { operations: Vec<OperationType> },
}

impl RuleConfig {
    fn compile(&self) -> Result<PolicyRule, ConfigError> {
        let predicate = match &self.predicate {
            PredicateConfig::RequireField { field } => Predicate::RequireField {
                field: field.clone(),
            },
            PredicateConfig::FieldMax { field, max } => Predicate::FieldMax {
                field: field.clone(),
                max: *max,
            },
            PredicateConfig::FieldPattern { field, pattern } => {
                let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidRule {
                    rule: self.id.clone(),
                    reason: format!("bad pattern: {e}"),
                })?;
                Predicate::FieldPattern {
                    field: field.clone(),
                    pattern,
                }
            }
            PredicateConfig::DeniedCallers { callers } => Predicate::DeniedCallers {
                callers: callers.clone(),
            },
            PredicateConfig::AllowedOperations { operations } => Predicate::AllowedOperations {
                operations: operations.clone(),
            },
        };
        Ok(PolicyRule::new(self.id.clone(), self.severity, predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_declared_rules() {
        let config: ComplianceConfig = toml::from_str(
            r#"
            [[rules]]
            id = "ticker-format"
            severity = "warning"
            predicate = { type = "field_pattern", field = "symbol", pattern = "^[A-Z]+$" }

            [[rules]]
            id = "amount-cap"
            predicate = { type = "field_max", field = "amount", max = "250000" }
            "#,
        )
        .unwrap();

        let rules = config.compile().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].severity(), Severity::Warning);
        assert_eq!(rules[1].severity(), Severity::Blocking);
        assert_eq!(rules[1].id().as_str(), "amount-cap");
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let config: ComplianceConfig = toml::from_str(
            r#"
            [[rules]]
            id = "broken"
            predicate = { type = "field_pattern", field = "symbol", pattern = "([" }
            "#,
        )
        .unwrap();

        let err = config.compile().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { .. }));
    }
}
