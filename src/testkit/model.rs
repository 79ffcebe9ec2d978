//! Mock model clients.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::ModelClient;
use crate::error::{Error, ProviderError, Result};

enum Behavior {
    /// Always return the same reply.
    Always(String),
    /// Always fail with the given reason.
    Failing(String),
    /// Sleep, then return the reply.
    Slow(Duration, String),
    /// Play back replies/failures in order, then fail when exhausted.
    Sequence(Mutex<VecDeque<std::result::Result<String, String>>>),
}

/// Scriptable [`ModelClient`] with call counting.
pub struct ScriptedModel {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedModel {
    #[must_use]
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Always(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Failing(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn slow(delay: Duration, reply: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Slow(delay, reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn sequence(steps: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            behavior: Behavior::Sequence(Mutex::new(steps.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completed `complete` invocations.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn provider_error(reason: String) -> Error {
    Error::Provider(ProviderError::Transport {
        provider: "scripted".into(),
        reason,
    })
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn vendor(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str, _max_tokens: usize) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Always(reply) => Ok(reply.clone()),
            Behavior::Failing(reason) => Err(provider_error(reason.clone())),
            Behavior::Slow(delay, reply) => {
                tokio::time::sleep(*delay).await;
                Ok(reply.clone())
            }
            Behavior::Sequence(steps) => {
                let step = steps.lock().pop_front();
                match step {
                    Some(Ok(reply)) => Ok(reply),
                    Some(Err(reason)) => Err(provider_error(reason)),
                    None => Err(provider_error("script exhausted".into())),
                }
            }
        }
    }
}
