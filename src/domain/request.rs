//! Immutable request value created at ingress.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{CallerId, RequestId};

/// The class of work a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Analysis,
    RiskAssessment,
    FraudCheck,
}

impl OperationType {
    /// Transaction-class operations are fraud-scored before routing.
    /// `Analysis` requests carry no transaction magnitude and never are.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::RiskAssessment | Self::FraudCheck)
    }

    /// Stable lowercase name for fingerprinting and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::RiskAssessment => "risk_assessment",
            Self::FraudCheck => "fraud_check",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An inbound request. Constructed once at ingress and never mutated;
/// the orchestrator only reads from it.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    caller: CallerId,
    operation: OperationType,
    payload: Map<String, Value>,
    submitted_at: DateTime<Utc>,
}

impl Request {
    /// Create a new request, stamping it with a fresh ID and timestamp.
    pub fn new(
        caller: impl Into<CallerId>,
        operation: OperationType,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            id: RequestId::generate(),
            caller: caller.into(),
            operation,
            payload,
            submitted_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    #[must_use]
    pub fn operation(&self) -> OperationType {
        self.operation
    }

    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Look up a payload field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Transaction magnitude, read from the payload's `amount` field.
    ///
    /// Accepts either a JSON number or a string-form decimal. Returns `None`
    /// when the field is absent or unparseable; such requests are not
    /// scoreable by the fraud stage.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        match self.payload.get("amount")? {
            Value::Number(n) => n.to_string().parse().ok(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}
