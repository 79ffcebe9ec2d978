//! Gateway configuration loading and validation.
//!
//! Configuration is loaded once at startup from a TOML file and treated as
//! immutable for the process lifetime. Provider API keys come from
//! environment variables, never from the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

mod logging;
mod policy;
mod provider;

pub use logging::LoggingConfig;
pub use policy::{ComplianceConfig, PredicateConfig, RuleConfig};
pub use provider::{ProviderConfig, ProviderKind};

/// Rate limiter settings: per-caller sliding window.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Maximum admitted requests per caller within one window.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl RateLimitConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            limit: default_limit(),
        }
    }
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_limit() -> usize {
    60
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live for cached responses, in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Upper bound a single-flight follower waits on the leader before
    /// computing independently, in milliseconds.
    #[serde(default = "default_wait_ms")]
    pub single_flight_wait_ms: u64,
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    #[must_use]
    pub fn single_flight_wait(&self) -> Duration {
        Duration::from_millis(self.single_flight_wait_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            single_flight_wait_ms: default_wait_ms(),
        }
    }
}

fn default_ttl_ms() -> u64 {
    300_000
}

fn default_wait_ms() -> u64 {
    45_000
}

/// Fraud scoring settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FraudConfig {
    /// Confidence above which a transaction-class request is rejected.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Ring-buffer capacity of each caller's anomaly series.
    #[serde(default = "default_series_capacity")]
    pub series_capacity: usize,
    /// Minimum observations before a score can flag anything.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            series_capacity: default_series_capacity(),
            min_samples: default_min_samples(),
        }
    }
}

fn default_threshold() -> f64 {
    0.75
}

fn default_series_capacity() -> usize {
    64
}

fn default_min_samples() -> usize {
    3
}

/// Background reference-data refresh settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RefresherConfig {
    /// Source URL for snapshot fetches.
    #[serde(default)]
    pub url: Option<String>,
    /// Interval between fetches, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Per-fetch timeout, in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl RefresherConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_ms: default_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    30_000
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

/// Provider router settings shared across endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Cooldown before a degraded endpoint is retried, in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl RouterConfig {
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

fn default_cooldown_ms() -> u64 {
    30_000
}

/// Main gateway configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fraud: FraudConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub refresher: RefresherConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.rate_limit.limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit.limit",
                reason: "must be at least 1".into(),
            });
        }
        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit.window_ms",
                reason: "must be positive".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.fraud.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "fraud.threshold",
                reason: format!("{} is outside [0.0, 1.0]", self.fraud.threshold),
            });
        }
        if self.fraud.series_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fraud.series_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.providers.is_empty() {
            return Err(ConfigError::MissingField { field: "providers" });
        }
        let mut names: Vec<&str> = self.providers.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.providers.len() {
            return Err(ConfigError::InvalidValue {
                field: "providers",
                reason: "provider names must be unique".into(),
            });
        }
        // Rules must compile so bad patterns fail here, not mid-request
        self.compliance.compile()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
