//! Background reference-data refresh.
//!
//! Runs beside the request path, never in it: fetch failures are logged and
//! retried on the next interval, and in-flight requests only ever see the
//! last complete snapshot.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::ResponseCache;
use crate::adapter::ReferenceSource;
use crate::config::RefresherConfig;
use crate::domain::Snapshot;

/// Atomically swappable snapshot shared with the request path.
///
/// Readers get an `Arc` to a complete snapshot; a concurrent swap never
/// exposes a partially updated one.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    #[must_use]
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn swap(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic snapshot fetcher with graceful cancellation.
pub struct BackgroundRefresher {
    source: Arc<dyn ReferenceSource>,
    store: Arc<SnapshotStore>,
    cache_sweep: Option<ResponseCache>,
    interval: Duration,
    fetch_timeout: Duration,
}

impl BackgroundRefresher {
    #[must_use]
    pub fn new(
        source: Arc<dyn ReferenceSource>,
        store: Arc<SnapshotStore>,
        config: &RefresherConfig,
    ) -> Self {
        Self {
            source,
            store,
            cache_sweep: None,
            interval: config.interval(),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// Also purge expired response-cache entries on each tick, piggybacking
    /// memory reclamation on the existing wake-up.
    #[must_use]
    pub fn with_cache_sweep(mut self, cache: ResponseCache) -> Self {
        self.cache_sweep = Some(cache);
        self
    }

    /// Run until the token is cancelled. An in-flight fetch is abandoned
    /// promptly on cancellation and no further wake-up is scheduled.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Reference refresher stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Reference refresher stopped mid-fetch");
                    return;
                }
                fetched = timeout(self.fetch_timeout, self.source.fetch_snapshot()) => {
                    match fetched {
                        Ok(Ok(snapshot)) => {
                            debug!(as_of = %snapshot.as_of, indicators = snapshot.indicators.len(), "Snapshot refreshed");
                            self.store.swap(snapshot);
                        }
                        Ok(Err(e)) => {
                            warn!(error = %e, "Snapshot fetch failed, keeping previous snapshot");
                        }
                        Err(_) => {
                            warn!(
                                timeout_ms = self.fetch_timeout.as_millis() as u64,
                                "Snapshot fetch timed out, keeping previous snapshot"
                            );
                        }
                    }
                }
            }

            if let Some(cache) = &self.cache_sweep {
                cache.purge_expired();
            }
        }
    }
}
