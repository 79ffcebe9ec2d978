//! Mock reference-data sources.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::ReferenceSource;
use crate::domain::Snapshot;
use crate::error::{Error, Result};

/// Returns a settable snapshot on every fetch.
pub struct StaticReference {
    snapshot: Mutex<Snapshot>,
}

impl StaticReference {
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Replace the snapshot returned by subsequent fetches.
    pub fn set(&self, snapshot: Snapshot) {
        *self.snapshot.lock() = snapshot;
    }
}

#[async_trait]
impl ReferenceSource for StaticReference {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        Ok(self.snapshot.lock().clone())
    }
}

/// Fails every fetch.
pub struct FailingReference;

#[async_trait]
impl ReferenceSource for FailingReference {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        Err(Error::ReferenceData("source unavailable".into()))
    }
}

/// Sleeps before returning, for cancellation and timeout tests.
pub struct SlowReference {
    delay: Duration,
    snapshot: Snapshot,
}

impl SlowReference {
    #[must_use]
    pub fn new(delay: Duration, snapshot: Snapshot) -> Self {
        Self { delay, snapshot }
    }
}

#[async_trait]
impl ReferenceSource for SlowReference {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        tokio::time::sleep(self.delay).await;
        Ok(self.snapshot.clone())
    }
}
