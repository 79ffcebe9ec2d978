//! Request orchestration.
//!
//! The gateway sequences each request through admission, compliance
//! validation, cache lookup, fraud scoring (transaction-class only), and
//! provider routing, and resolves it to exactly one terminal [`Outcome`].

pub mod prompt;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::{FailReason, Fingerprint, Outcome, RejectReason, Request};
use crate::error::{Error, Result};
use crate::service::{
    Admission, ComplianceValidator, Constraints, FraudScorer, Lookup, ModelRouter, RateLimiter,
    ResponseCache, SnapshotStore,
};

/// The pipeline coordinator. One instance per process, shared across all
/// concurrent requests; it holds no per-request state of its own.
pub struct Gateway {
    limiter: RateLimiter,
    validator: ComplianceValidator,
    cache: ResponseCache,
    fraud: FraudScorer,
    router: Arc<ModelRouter>,
    snapshots: Arc<SnapshotStore>,
}

impl Gateway {
    /// Wire the pipeline from configuration plus the externally constructed
    /// router and snapshot store.
    pub fn new(
        config: &Config,
        router: Arc<ModelRouter>,
        snapshots: Arc<SnapshotStore>,
    ) -> Result<Self> {
        let rules = config.compliance.compile()?;
        info!(
            rules = rules.len(),
            providers = router.status().len(),
            "Gateway initialized"
        );
        Ok(Self {
            limiter: RateLimiter::new(&config.rate_limit),
            validator: ComplianceValidator::new(rules),
            cache: ResponseCache::new(&config.cache),
            fraud: FraudScorer::new(&config.fraud),
            router,
            snapshots,
        })
    }

    /// The response cache, for wiring the refresher's sweep.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Orchestrate one request to a terminal outcome.
    pub async fn submit(&self, request: Request) -> Outcome {
        let outcome = self.run_pipeline(&request).await;
        let elapsed_ms = (chrono::Utc::now() - request.submitted_at())
            .num_milliseconds()
            .max(0);
        info!(
            request_id = %request.id(),
            caller = %request.caller(),
            operation = %request.operation(),
            outcome = outcome.reason_code(),
            elapsed_ms,
            "Request resolved"
        );
        outcome
    }

    async fn run_pipeline(&self, request: &Request) -> Outcome {
        // Admitted
        if let Admission::Rejected { retry_after } = self.limiter.admit(request.caller()) {
            debug!(
                request_id = %request.id(),
                caller = %request.caller(),
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            return Outcome::Rejected(RejectReason::RateLimited { retry_after });
        }

        // Validated
        let report = self.validator.validate(request);
        let blocking = report.blocking();
        if !blocking.is_empty() {
            return Outcome::Rejected(RejectReason::ComplianceViolation {
                violations: blocking,
            });
        }
        let warnings = report.warnings();

        // CacheChecked
        let fingerprint = Fingerprint::of(request);
        if let Lookup::Hit(response) = self.cache.lookup(&fingerprint) {
            debug!(request_id = %request.id(), fingerprint = %fingerprint, "Cache hit");
            return Outcome::Completed {
                response,
                cached: true,
                warnings,
            };
        }

        // FraudChecked (transaction-class requests only)
        if request.operation().is_transactional() {
            match request.amount() {
                Some(magnitude) => {
                    let snapshot = self.snapshots.load();
                    let assessment = self.fraud.score(request.caller(), magnitude, &snapshot);
                    if assessment.anomalous {
                        warn!(
                            request_id = %request.id(),
                            caller = %request.caller(),
                            confidence = assessment.confidence,
                            "Suspected fraud"
                        );
                        return Outcome::Rejected(RejectReason::SuspectedFraud {
                            confidence: assessment.confidence,
                        });
                    }
                }
                None => {
                    debug!(
                        request_id = %request.id(),
                        "Transactional request without amount, skipping fraud score"
                    );
                }
            }
        }

        // Routed, with single-flight coordination on the fingerprint
        let snapshot = self.snapshots.load();
        let prompt = prompt::build_prompt(request, &snapshot);
        let router = self.router.clone();
        let routed = self
            .cache
            .get_or_compute(&fingerprint, move || {
                let router = router.clone();
                let prompt = prompt.clone();
                async move {
                    let reply = router
                        .invoke(&prompt, &Constraints::default())
                        .await
                        .map_err(Error::Provider)?;
                    Ok(reply.text)
                }
            })
            .await;

        match routed {
            Ok((response, cached)) => Outcome::Completed {
                response,
                cached,
                warnings,
            },
            // Transient provider errors never escape the router; only the
            // terminal exhaustion form reaches this point.
            Err(Error::Provider(e)) if !e.is_transient() => {
                error!(request_id = %request.id(), "All providers exhausted");
                Outcome::Failed(FailReason::AllProvidersExhausted)
            }
            Err(e) => {
                error!(request_id = %request.id(), error = %e, "Request failed internally");
                Outcome::Failed(FailReason::Internal)
            }
        }
    }
}
