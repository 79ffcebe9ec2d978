//! Priority-ordered provider routing with failover.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::adapter::ModelClient;
use crate::config::{ProviderConfig, RouterConfig};
use crate::error::ProviderError;

/// Smoothing factor for the per-endpoint latency average.
const LATENCY_EWMA_ALPHA: f64 = 0.2;

/// Per-call constraints supplied by the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Constraints {
    /// Overrides the endpoint's configured max tokens when set.
    pub max_tokens: Option<usize>,
}

/// A successful provider invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub provider: String,
    pub text: String,
    pub latency: Duration,
}

/// Endpoint health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Healthy,
    /// Excluded from routing until the cooldown elapses, then retried
    /// optimistically.
    Degraded { since: Instant },
}

struct EndpointState {
    health: Health,
    avg_latency: Option<Duration>,
}

/// One provider endpoint in the routing table.
struct ProviderEndpoint {
    name: String,
    priority: u8,
    call_timeout: Duration,
    max_tokens: usize,
    client: Arc<dyn ModelClient>,
    state: Mutex<EndpointState>,
}

impl ProviderEndpoint {
    /// Whether this endpoint may be attempted right now.
    fn is_eligible(&self, cooldown: Duration) -> bool {
        match self.state.lock().health {
            Health::Healthy => true,
            Health::Degraded { since } => since.elapsed() >= cooldown,
        }
    }

    fn mark_healthy(&self, latency: Duration) {
        let mut state = self.state.lock();
        state.health = Health::Healthy;
        state.avg_latency = Some(match state.avg_latency {
            Some(avg) => avg.mul_f64(1.0 - LATENCY_EWMA_ALPHA) + latency.mul_f64(LATENCY_EWMA_ALPHA),
            None => latency,
        });
    }

    fn mark_degraded(&self) {
        self.state.lock().health = Health::Degraded {
            since: Instant::now(),
        };
    }
}

/// Observable endpoint state, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStatus {
    pub name: String,
    pub priority: u8,
    pub healthy: bool,
    pub avg_latency: Option<Duration>,
}

/// Routes prompts to the highest-priority healthy provider, degrading
/// endpoints on failure and retrying them after a cooldown.
pub struct ModelRouter {
    endpoints: Vec<ProviderEndpoint>,
    cooldown: Duration,
}

impl ModelRouter {
    /// Build a router from configured endpoints and their clients, ordered
    /// by priority (ties keep configuration order).
    #[must_use]
    pub fn new(
        endpoints: Vec<(ProviderConfig, Arc<dyn ModelClient>)>,
        config: &RouterConfig,
    ) -> Self {
        let mut endpoints: Vec<ProviderEndpoint> = endpoints
            .into_iter()
            .map(|(cfg, client)| ProviderEndpoint {
                name: cfg.name,
                priority: cfg.priority,
                call_timeout: Duration::from_millis(cfg.timeout_ms),
                max_tokens: cfg.max_tokens,
                client,
                state: Mutex::new(EndpointState {
                    health: Health::Healthy,
                    avg_latency: None,
                }),
            })
            .collect();
        endpoints.sort_by_key(|e| e.priority);
        Self {
            endpoints,
            cooldown: config.cooldown(),
        }
    }

    /// Invoke the prompt against providers in priority order.
    ///
    /// A timeout or error degrades the endpoint and falls through to the
    /// next; the call is abandoned at the deadline, never left hanging.
    /// Returns `AllProvidersExhausted` once every eligible endpoint failed.
    pub async fn invoke(
        &self,
        prompt: &str,
        constraints: &Constraints,
    ) -> Result<ModelReply, ProviderError> {
        for endpoint in &self.endpoints {
            if !endpoint.is_eligible(self.cooldown) {
                debug!(provider = %endpoint.name, "Skipping degraded endpoint");
                continue;
            }

            let max_tokens = constraints.max_tokens.unwrap_or(endpoint.max_tokens);
            let started = Instant::now();
            match timeout(
                endpoint.call_timeout,
                endpoint.client.complete(prompt, max_tokens),
            )
            .await
            {
                Ok(Ok(text)) => {
                    let latency = started.elapsed();
                    endpoint.mark_healthy(latency);
                    info!(
                        provider = %endpoint.name,
                        latency_ms = latency.as_millis() as u64,
                        "Provider call succeeded"
                    );
                    return Ok(ModelReply {
                        provider: endpoint.name.clone(),
                        text,
                        latency,
                    });
                }
                Ok(Err(e)) => {
                    warn!(provider = %endpoint.name, error = %e, "Provider call failed");
                    endpoint.mark_degraded();
                }
                Err(_) => {
                    let err = ProviderError::Timeout {
                        provider: endpoint.name.clone(),
                        timeout_ms: endpoint.call_timeout.as_millis() as u64,
                    };
                    warn!(provider = %endpoint.name, error = %err, "Provider call timed out");
                    endpoint.mark_degraded();
                }
            }
        }

        Err(ProviderError::AllProvidersExhausted)
    }

    /// Current health table snapshot.
    #[must_use]
    pub fn status(&self) -> Vec<EndpointStatus> {
        self.endpoints
            .iter()
            .map(|e| {
                let state = e.state.lock();
                EndpointStatus {
                    name: e.name.clone(),
                    priority: e.priority,
                    healthy: matches!(state.health, Health::Healthy),
                    avg_latency: state.avg_latency,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::model::ScriptedModel;

    fn endpoint(name: &str, priority: u8, timeout_ms: u64) -> ProviderConfig {
        ProviderConfig {
            name: name.into(),
            kind: Default::default(),
            model: "test-model".into(),
            priority,
            timeout_ms,
            max_tokens: 256,
            temperature: 0.0,
        }
    }

    fn router(
        endpoints: Vec<(ProviderConfig, Arc<dyn ModelClient>)>,
        cooldown_ms: u64,
    ) -> ModelRouter {
        ModelRouter::new(endpoints, &RouterConfig { cooldown_ms })
    }

    #[tokio::test]
    async fn routes_to_highest_priority_endpoint() {
        let primary = Arc::new(ScriptedModel::always("from-primary"));
        let backup = Arc::new(ScriptedModel::always("from-backup"));
        let router = router(
            vec![
                (endpoint("backup", 1, 1_000), backup.clone() as _),
                (endpoint("primary", 0, 1_000), primary.clone() as _),
            ],
            30_000,
        );

        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "primary");
        assert_eq!(reply.text, "from-primary");
        assert_eq!(backup.calls(), 0);
    }

    #[tokio::test]
    async fn fails_over_and_degrades_failing_endpoints() {
        let first = Arc::new(ScriptedModel::failing("down"));
        let second = Arc::new(ScriptedModel::failing("down"));
        let third = Arc::new(ScriptedModel::always("from-third"));
        let router = router(
            vec![
                (endpoint("first", 0, 1_000), first as _),
                (endpoint("second", 1, 1_000), second as _),
                (endpoint("third", 2, 1_000), third as _),
            ],
            30_000,
        );

        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "third");

        let status = router.status();
        assert!(!status[0].healthy);
        assert!(!status[1].healthy);
        assert!(status[2].healthy);
    }

    #[tokio::test]
    async fn timeout_counts_as_failure() {
        let slow = Arc::new(ScriptedModel::slow(Duration::from_millis(200), "late"));
        let fast = Arc::new(ScriptedModel::always("fast"));
        let router = router(
            vec![
                (endpoint("slow", 0, 20), slow as _),
                (endpoint("fast", 1, 1_000), fast as _),
            ],
            30_000,
        );

        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "fast");
        assert!(!router.status()[0].healthy);
    }

    #[tokio::test]
    async fn exhaustion_when_all_fail() {
        let router = router(
            vec![
                (
                    endpoint("a", 0, 1_000),
                    Arc::new(ScriptedModel::failing("down")) as _,
                ),
                (
                    endpoint("b", 1, 1_000),
                    Arc::new(ScriptedModel::failing("down")) as _,
                ),
            ],
            30_000,
        );

        let err = router.invoke("p", &Constraints::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AllProvidersExhausted));
    }

    #[tokio::test]
    async fn degraded_endpoint_is_skipped_within_cooldown() {
        let flaky = Arc::new(ScriptedModel::sequence(vec![
            Err("down".to_string()),
            Ok("recovered".to_string()),
        ]));
        let backup = Arc::new(ScriptedModel::always("from-backup"));
        let router = router(
            vec![
                (endpoint("flaky", 0, 1_000), flaky.clone() as _),
                (endpoint("backup", 1, 1_000), backup as _),
            ],
            60_000,
        );

        // First call degrades flaky and falls through
        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "backup");

        // Second call skips flaky entirely while the cooldown holds
        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "backup");
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test]
    async fn degraded_endpoint_recovers_after_cooldown() {
        let flaky = Arc::new(ScriptedModel::sequence(vec![
            Err("down".to_string()),
            Ok("recovered".to_string()),
        ]));
        let backup = Arc::new(ScriptedModel::always("from-backup"));
        let router = router(
            vec![
                (endpoint("flaky", 0, 1_000), flaky as _),
                (endpoint("backup", 1, 1_000), backup as _),
            ],
            30,
        );

        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "backup");

        tokio::time::sleep(Duration::from_millis(50)).await;

        let reply = router.invoke("p", &Constraints::default()).await.unwrap();
        assert_eq!(reply.provider, "flaky");
        assert_eq!(reply.text, "recovered");
        assert!(router.status()[0].healthy);
    }
}
