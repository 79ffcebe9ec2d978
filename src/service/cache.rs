//! TTL response cache with single-flight computation.
//!
//! Concurrent misses for one fingerprint coordinate so only the first caller
//! (the leader) triggers the expensive downstream call; the rest wait for its
//! result. The leader's computation runs in a spawned task, so a result that
//! arrives after the original caller cancels still populates the cache — it
//! is just never delivered to anyone no longer listening.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::domain::Fingerprint;
use crate::error::Result;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(String),
    Miss,
}

struct CacheEntry {
    response: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

struct Inner {
    entries: DashMap<Fingerprint, CacheEntry>,
    /// Receivers for computations currently in flight, keyed by fingerprint.
    /// Presence of a key means a leader owns the matching sender.
    inflight: DashMap<Fingerprint, watch::Receiver<Option<String>>>,
}

impl Inner {
    fn store(&self, fingerprint: &Fingerprint, response: String, ttl: Duration) {
        let now = Instant::now();
        self.entries.insert(
            fingerprint.clone(),
            CacheEntry {
                response,
                expires_at: now + ttl,
            },
        );
    }
}

/// Shared response cache. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Inner>,
    default_ttl: Duration,
    wait_bound: Duration,
}

impl ResponseCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                inflight: DashMap::new(),
            }),
            default_ttl: config.ttl(),
            wait_bound: config.single_flight_wait(),
        }
    }

    /// Look up a fingerprint. Expiry is lazy: an entry past its TTL reads as
    /// a miss and is evicted on the way out.
    #[must_use]
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Lookup {
        let now = Instant::now();
        if let Some(entry) = self.inner.entries.get(fingerprint) {
            if !entry.is_expired(now) {
                return Lookup::Hit(entry.response.clone());
            }
        }
        // Reclaim only if still expired; a concurrent store may have renewed it
        self.inner
            .entries
            .remove_if(fingerprint, |_, entry| entry.is_expired(now));
        Lookup::Miss
    }

    /// Store a response, overwriting any existing entry (last-writer-wins).
    pub fn store(&self, fingerprint: &Fingerprint, response: String, ttl: Duration) {
        self.inner.store(fingerprint, response, ttl);
    }

    /// Drop all expired entries. Correctness never depends on this running;
    /// it only reclaims memory sooner than lazy expiry would.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.inner.entries.retain(|_, entry| !entry.is_expired(now));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Return the cached response or compute it, with single-flight
    /// coordination per fingerprint.
    ///
    /// The boolean in the result is true when the response came from the
    /// cache or from another caller's in-flight computation. A follower
    /// waits at most the configured bound for the leader, then computes
    /// independently rather than queuing behind a stuck one.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        make: F,
    ) -> Result<(String, bool)>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        if let Lookup::Hit(response) = self.lookup(fingerprint) {
            return Ok((response, true));
        }

        enum Role {
            Leader(tokio::task::JoinHandle<Result<String>>),
            Follower(watch::Receiver<Option<String>>),
        }

        let role = match self.inner.inflight.entry(fingerprint.clone()) {
            Entry::Occupied(entry) => Role::Follower(entry.get().clone()),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                let inner = self.inner.clone();
                let fp = fingerprint.clone();
                let ttl = self.default_ttl;
                let fut = make();
                Role::Leader(tokio::spawn(async move {
                    let result = fut.await;
                    if let Ok(response) = &result {
                        inner.store(&fp, response.clone(), ttl);
                        let _ = tx.send(Some(response.clone()));
                    }
                    // Dropping tx wakes followers even on the error path
                    inner.inflight.remove(&fp);
                    result
                }))
            }
        };

        match role {
            Role::Leader(handle) => {
                let response = handle.await??;
                Ok((response, false))
            }
            Role::Follower(mut rx) => {
                let waited = timeout(self.wait_bound, async {
                    loop {
                        if let Some(response) = rx.borrow_and_update().as_ref() {
                            return Some(response.clone());
                        }
                        if rx.changed().await.is_err() {
                            return rx.borrow().clone();
                        }
                    }
                })
                .await;

                match waited {
                    Ok(Some(response)) => {
                        debug!(fingerprint = %fingerprint, "Served from in-flight computation");
                        Ok((response, true))
                    }
                    Ok(None) => {
                        debug!(fingerprint = %fingerprint, "Leader failed, computing independently");
                        self.compute_independently(fingerprint, make).await
                    }
                    Err(_) => {
                        warn!(
                            fingerprint = %fingerprint,
                            wait_ms = self.wait_bound.as_millis() as u64,
                            "Single-flight wait bound exceeded, computing independently"
                        );
                        self.compute_independently(fingerprint, make).await
                    }
                }
            }
        }
    }

    async fn compute_independently<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        make: F,
    ) -> Result<(String, bool)>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let response = make().await?;
        self.store(fingerprint, response.clone(), self.default_ttl);
        Ok((response, false))
    }
}
