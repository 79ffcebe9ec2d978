use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// These are fatal at startup only: a process never begins serving with an
/// invalid configuration, and no per-request path produces them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid policy rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors from model provider invocations.
///
/// `Timeout`, `Transport`, and `Status` are transient per-endpoint failures:
/// the router degrades the endpoint and falls through to the next-priority
/// one, so they never surface to the caller. `AllProvidersExhausted` is the
/// terminal form once every eligible endpoint has failed.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider '{provider}' timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("provider '{provider}' transport error: {reason}")]
    Transport { provider: String, reason: String },

    #[error("provider '{provider}' returned error status: {reason}")]
    Status { provider: String, reason: String },

    #[error("all providers exhausted")]
    AllProvidersExhausted,
}

impl ProviderError {
    /// True if a retry against another endpoint could succeed. The terminal
    /// exhaustion form is the only non-transient variant.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::AllProvidersExhausted)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("reference data error: {0}")]
    ReferenceData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
