//! Reference-data snapshots consumed by fraud scoring and prompt building.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point-in-time view of external market/reference indicators.
///
/// Refreshed in the background and swapped atomically; the request path only
/// ever reads a complete snapshot, never a half-updated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the source produced this snapshot.
    pub as_of: DateTime<Utc>,
    /// Named indicators, e.g. `volatility_floor` or `index_level`.
    pub indicators: HashMap<String, Decimal>,
}

impl Snapshot {
    /// An empty snapshot used before the first successful refresh.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            as_of: DateTime::<Utc>::MIN_UTC,
            indicators: HashMap::new(),
        }
    }

    /// Look up an indicator by name.
    #[must_use]
    pub fn indicator(&self, name: &str) -> Option<Decimal> {
        self.indicators.get(name).copied()
    }

    /// True if no refresh has populated this snapshot yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
