//! Per-caller sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::domain::CallerId;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// At capacity. `retry_after` is the time until the oldest counted
    /// request leaves the window.
    Rejected { retry_after: Duration },
}

impl Admission {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Sliding-window request limiter, partitioned by caller.
///
/// Each caller's window is a log of admission timestamps. The map entry is
/// held exclusively for the duration of the check-and-append, so concurrent
/// `admit` calls for one caller serialize and the budget can never overrun;
/// distinct callers proceed in parallel on separate shards.
pub struct RateLimiter {
    windows: DashMap<CallerId, VecDeque<Instant>>,
    window: Duration,
    limit: usize,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: config.window(),
            limit: config.limit,
        }
    }

    /// Admit or reject one request for the caller.
    ///
    /// Rejected requests are not counted against the budget.
    #[must_use]
    pub fn admit(&self, caller: &CallerId) -> Admission {
        let now = Instant::now();
        let mut log = self.windows.entry(caller.clone()).or_default();

        // Evict timestamps that have slid out of the window
        while log
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            log.pop_front();
        }

        if log.len() < self.limit {
            log.push_back(now);
            Admission::Allowed
        } else {
            let oldest = log.front().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            Admission::Rejected { retry_after }
        }
    }

    /// Number of requests currently counted for a caller.
    #[must_use]
    pub fn current_count(&self, caller: &CallerId) -> usize {
        let now = Instant::now();
        self.windows.get(caller).map_or(0, |log| {
            log.iter()
                .filter(|t| now.duration_since(**t) < self.window)
                .count()
        })
    }
}
