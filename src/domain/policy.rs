//! Declarative compliance policy rules.
//!
//! Rules are data, not code: each rule pairs an identifier and severity with
//! a predicate drawn from a small closed set of conditions over the request.
//! The set is loaded once at startup and immutable for the process lifetime.

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::RuleId;
use super::request::{OperationType, Request};

/// How a violated rule affects the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Violation aborts the request.
    Blocking,
    /// Violation is recorded and carried in the outcome, never aborts.
    Warning,
}

/// A compiled predicate over a request. Returns true when the request
/// satisfies the condition; false is a violation of the owning rule.
#[derive(Debug)]
pub enum Predicate {
    /// The named payload field must be present.
    RequireField { field: String },
    /// The named payload field, read as a decimal, must not exceed `max`.
    /// A missing field passes; pair with `RequireField` to also demand it.
    FieldMax { field: String, max: Decimal },
    /// The named payload field, read as a string, must match the pattern.
    FieldPattern { field: String, pattern: Regex },
    /// The caller must not appear on the denied list.
    DeniedCallers { callers: Vec<String> },
    /// The operation type must be one of the listed operations.
    AllowedOperations { operations: Vec<OperationType> },
}

impl Predicate {
    /// Evaluate the predicate against a request. Pure: no mutation, no I/O.
    #[must_use]
    pub fn holds(&self, request: &Request) -> bool {
        match self {
            Self::RequireField { field } => request.field(field).is_some(),
            Self::FieldMax { field, max } => match request.field(field) {
                Some(value) => decimal_of(value).is_some_and(|v| v <= *max),
                None => true,
            },
            Self::FieldPattern { field, pattern } => match request.field(field) {
                Some(serde_json::Value::String(s)) => pattern.is_match(s),
                Some(_) => false,
                None => true,
            },
            Self::DeniedCallers { callers } => {
                !callers.iter().any(|c| c == request.caller().as_str())
            }
            Self::AllowedOperations { operations } => operations.contains(&request.operation()),
        }
    }
}

fn decimal_of(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// One compliance rule: identity, severity, and the condition it enforces.
#[derive(Debug)]
pub struct PolicyRule {
    id: RuleId,
    severity: Severity,
    predicate: Predicate,
}

impl PolicyRule {
    pub fn new(id: impl Into<RuleId>, severity: Severity, predicate: Predicate) -> Self {
        Self {
            id: id.into(),
            severity,
            predicate,
        }
    }

    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// True when the request satisfies this rule.
    #[must_use]
    pub fn passes(&self, request: &Request) -> bool {
        self.predicate.holds(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::{json, Map};

    fn request(caller: &str, op: OperationType, pairs: &[(&str, serde_json::Value)]) -> Request {
        let mut payload = Map::new();
        for (k, v) in pairs {
            payload.insert((*k).to_string(), v.clone());
        }
        Request::new(caller, op, payload)
    }

    #[test]
    fn require_field() {
        let p = Predicate::RequireField {
            field: "symbol".into(),
        };
        assert!(p.holds(&request("a", OperationType::Analysis, &[("symbol", json!("AAPL"))])));
        assert!(!p.holds(&request("a", OperationType::Analysis, &[])));
    }

    #[test]
    fn field_max_bounds_amount() {
        let p = Predicate::FieldMax {
            field: "amount".into(),
            max: dec!(1000),
        };
        assert!(p.holds(&request("a", OperationType::FraudCheck, &[("amount", json!(999))])));
        assert!(!p.holds(&request("a", OperationType::FraudCheck, &[("amount", json!(1001))])));
        // Absent field is not this rule's concern
        assert!(p.holds(&request("a", OperationType::FraudCheck, &[])));
    }

    #[test]
    fn field_pattern_rejects_non_strings() {
        let p = Predicate::FieldPattern {
            field: "symbol".into(),
            pattern: Regex::new("^[A-Z]{1,5}$").unwrap(),
        };
        assert!(p.holds(&request("a", OperationType::Analysis, &[("symbol", json!("AAPL"))])));
        assert!(!p.holds(&request("a", OperationType::Analysis, &[("symbol", json!("aapl!"))])));
        assert!(!p.holds(&request("a", OperationType::Analysis, &[("symbol", json!(42))])));
    }

    #[test]
    fn denied_callers() {
        let p = Predicate::DeniedCallers {
            callers: vec!["blocked".into()],
        };
        assert!(!p.holds(&request("blocked", OperationType::Analysis, &[])));
        assert!(p.holds(&request("fine", OperationType::Analysis, &[])));
    }

    #[test]
    fn allowed_operations() {
        let p = Predicate::AllowedOperations {
            operations: vec![OperationType::Analysis],
        };
        assert!(p.holds(&request("a", OperationType::Analysis, &[])));
        assert!(!p.holds(&request("a", OperationType::FraudCheck, &[])));
    }
}
