//! Terminal request outcomes.
//!
//! Every submitted request resolves to exactly one `Outcome`, each carrying
//! a stable reason code; no request is ever dropped without a classified
//! reason.

use std::time::Duration;

use super::id::RuleId;

/// Why a request was rejected before reaching a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The caller's sliding-window budget is spent.
    RateLimited { retry_after: Duration },
    /// One or more blocking policy rules failed. The list is complete, not
    /// just the first violation.
    ComplianceViolation { violations: Vec<RuleId> },
    /// The fraud scorer flagged the request above the configured threshold.
    SuspectedFraud { confidence: f64 },
}

/// Why a request that passed all gates still could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// Every eligible provider endpoint failed or timed out.
    AllProvidersExhausted,
    /// An internal fault (e.g. a panicked computation task).
    Internal,
}

/// The terminal result of orchestrating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A response was produced, either freshly routed or served from cache.
    Completed {
        response: String,
        cached: bool,
        /// Non-blocking policy rules the request violated.
        warnings: Vec<RuleId>,
    },
    Rejected(RejectReason),
    Failed(FailReason),
}

impl Outcome {
    /// Stable, machine-readable reason code for this outcome.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Rejected(RejectReason::RateLimited { .. }) => "rate_limited",
            Self::Rejected(RejectReason::ComplianceViolation { .. }) => "compliance_violation",
            Self::Rejected(RejectReason::SuspectedFraud { .. }) => "suspected_fraud",
            Self::Failed(FailReason::AllProvidersExhausted) => "all_providers_exhausted",
            Self::Failed(FailReason::Internal) => "internal_error",
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The response text, if the request completed.
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Completed { response, .. } => Some(response),
            _ => None,
        }
    }
}
