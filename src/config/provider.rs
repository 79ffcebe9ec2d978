//! Model provider configuration.

use serde::Deserialize;

/// Which vendor API a provider entry speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    OpenAi,
}

/// One provider endpoint in the routing table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Unique name for logging and health reporting.
    pub name: String,
    /// Vendor API dialect.
    #[serde(default)]
    pub kind: ProviderKind,
    /// Model name sent to the vendor.
    #[serde(default = "default_model")]
    pub model: String,
    /// Routing priority; lower values are tried first.
    #[serde(default)]
    pub priority: u8,
    /// Per-call timeout. A call exceeding it counts as a failure.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum tokens in the response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_tokens() -> usize {
    4096
}

fn default_temperature() -> f64 {
    0.2
}
