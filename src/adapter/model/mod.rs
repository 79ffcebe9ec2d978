//! Model provider client abstraction.

mod anthropic;
mod openai;

pub use anthropic::Anthropic;
pub use openai::OpenAi;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::Result;

/// A completion client for one vendor API.
///
/// Implementations are plain HTTP calls with no retry or timeout logic of
/// their own; failover and per-call deadlines belong to the router.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Vendor dialect name for logging.
    fn vendor(&self) -> &'static str;

    /// Send a completion request and return the response text.
    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String>;
}

/// Construct the client for a configured provider endpoint.
///
/// API keys come from the environment (`ANTHROPIC_API_KEY`,
/// `OPENAI_API_KEY`); a missing key is a startup configuration error.
pub fn build_client(config: &ProviderConfig) -> Result<Arc<dyn ModelClient>> {
    let client: Arc<dyn ModelClient> = match config.kind {
        ProviderKind::Anthropic => {
            Arc::new(Anthropic::from_env(&config.model, config.temperature)?)
        }
        ProviderKind::OpenAi => Arc::new(OpenAi::from_env(&config.model, config.temperature)?),
    };
    debug!(
        provider = %config.name,
        vendor = client.vendor(),
        model = %config.model,
        "Provider client constructed"
    );
    Ok(client)
}
