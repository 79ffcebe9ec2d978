//! Deterministic request fingerprints used as cache keys.

use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::request::Request;

/// SHA-256 digest of a request's semantic content.
///
/// A pure function of `(operation, payload)`: object keys are sorted
/// recursively before hashing so insertion order never leaks into the key,
/// and no salt is mixed in, so the fingerprint is stable across process
/// restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a request.
    #[must_use]
    pub fn of(request: &Request) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(request.operation().as_str().as_bytes());
        hasher.update(b"\x1f");
        let mut canonical = String::new();
        write_canonical(&Value::Object(request.payload().clone()), &mut canonical);
        hasher.update(canonical.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialize a JSON value with object keys in sorted order.
///
/// `serde_json::to_string` preserves map insertion order, which would make
/// the hash depend on how the payload was assembled.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::OperationType;
    use serde_json::{json, Map};

    fn request_with(pairs: &[(&str, Value)], op: OperationType) -> Request {
        let mut payload = Map::new();
        for (k, v) in pairs {
            payload.insert((*k).to_string(), v.clone());
        }
        Request::new("acct-1", op, payload)
    }

    #[test]
    fn insertion_order_does_not_change_fingerprint() {
        let a = request_with(
            &[("symbol", json!("AAPL")), ("horizon", json!("30d"))],
            OperationType::Analysis,
        );
        let b = request_with(
            &[("horizon", json!("30d")), ("symbol", json!("AAPL"))],
            OperationType::Analysis,
        );
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn content_changes_fingerprint() {
        let a = request_with(&[("symbol", json!("AAPL"))], OperationType::Analysis);
        let b = request_with(&[("symbol", json!("MSFT"))], OperationType::Analysis);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn operation_type_changes_fingerprint() {
        let a = request_with(&[("symbol", json!("AAPL"))], OperationType::Analysis);
        let b = request_with(&[("symbol", json!("AAPL"))], OperationType::RiskAssessment);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn caller_does_not_change_fingerprint() {
        let mut payload = Map::new();
        payload.insert("symbol".into(), json!("AAPL"));
        let a = Request::new("acct-1", OperationType::Analysis, payload.clone());
        let b = Request::new("acct-2", OperationType::Analysis, payload);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn nested_objects_are_canonicalized() {
        let a = request_with(
            &[("filters", json!({"min": 1, "max": 2}))],
            OperationType::Analysis,
        );
        let b = request_with(
            &[("filters", json!({"max": 2, "min": 1}))],
            OperationType::Analysis,
        );
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }
}
