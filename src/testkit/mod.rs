//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`model`] — Mock [`ModelClient`](crate::adapter::ModelClient)
//!   implementations: scripted, slow, and failing providers.
//! - [`reference`] — Mock [`ReferenceSource`](crate::adapter::ReferenceSource)
//!   implementations for refresher tests.

pub mod model;
pub mod reference;

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use crate::domain::{OperationType, Request, Snapshot};

/// Build an analysis request for a symbol.
#[must_use]
pub fn analysis_request(caller: &str, symbol: &str) -> Request {
    let mut payload = Map::new();
    payload.insert("symbol".into(), json!(symbol));
    Request::new(caller, OperationType::Analysis, payload)
}

/// Build a fraud-check request carrying a transaction amount.
#[must_use]
pub fn fraud_request(caller: &str, amount: Decimal) -> Request {
    let mut payload = Map::new();
    payload.insert("amount".into(), Value::String(amount.to_string()));
    Request::new(caller, OperationType::FraudCheck, payload)
}

/// Build a request with explicit payload fields.
#[must_use]
pub fn request_with(caller: &str, operation: OperationType, fields: &[(&str, Value)]) -> Request {
    let mut payload = Map::new();
    for (key, value) in fields {
        payload.insert((*key).to_string(), value.clone());
    }
    Request::new(caller, operation, payload)
}

/// Build a snapshot with the given indicators, stamped now.
#[must_use]
pub fn snapshot_with(indicators: &[(&str, Decimal)]) -> Snapshot {
    Snapshot {
        as_of: chrono::Utc::now(),
        indicators: indicators
            .iter()
            .map(|(name, value)| ((*name).to_string(), *value))
            .collect(),
    }
}
