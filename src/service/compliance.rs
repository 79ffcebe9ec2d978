//! Compliance rule evaluation.

use tracing::debug;

use crate::domain::{PolicyRule, Request, RuleId, Severity};

/// One rule the request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: RuleId,
    pub severity: Severity,
}

/// The complete result of evaluating every rule against a request.
#[derive(Debug, Clone, Default)]
pub struct ComplianceReport {
    violations: Vec<Violation>,
}

impl ComplianceReport {
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Rule ids of blocking violations. Non-empty means the pipeline aborts.
    #[must_use]
    pub fn blocking(&self) -> Vec<RuleId> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Blocking)
            .map(|v| v.rule.clone())
            .collect()
    }

    /// Rule ids of warning-severity violations; recorded, never aborting.
    #[must_use]
    pub fn warnings(&self) -> Vec<RuleId> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .map(|v| v.rule.clone())
            .collect()
    }
}

/// Evaluates the immutable process ruleset against requests.
///
/// Every rule is always evaluated — no short-circuiting — so the caller
/// receives the complete violation list. Pure over `(request, ruleset)`.
pub struct ComplianceValidator {
    rules: Vec<PolicyRule>,
}

impl ComplianceValidator {
    #[must_use]
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate all rules against the request.
    #[must_use]
    pub fn validate(&self, request: &Request) -> ComplianceReport {
        let violations: Vec<Violation> = self
            .rules
            .iter()
            .filter(|rule| !rule.passes(request))
            .map(|rule| {
                debug!(
                    request_id = %request.id(),
                    rule = %rule.id(),
                    severity = ?rule.severity(),
                    "Policy rule violated"
                );
                Violation {
                    rule: rule.id().clone(),
                    severity: rule.severity(),
                }
            })
            .collect();

        ComplianceReport { violations }
    }
}
