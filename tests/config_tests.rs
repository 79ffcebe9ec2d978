use std::io::Write;

use modelgate::config::{Config, ProviderKind};
use modelgate::error::{ConfigError, Error};
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes())
        .expect("write temp config");
    file
}

#[test]
fn config_loads_full_file() {
    let toml = r#"
[logging]
level = "debug"
format = "json"

[rate_limit]
window_ms = 10000
limit = 5

[cache]
ttl_ms = 120000
single_flight_wait_ms = 30000

[fraud]
threshold = 0.9
series_capacity = 32
min_samples = 5

[router]
cooldown_ms = 15000

[refresher]
url = "https://reference.example.com/snapshot"
interval_ms = 60000
fetch_timeout_ms = 2000

[[compliance.rules]]
id = "amount-cap"
predicate = { type = "field_max", field = "amount", max = "250000" }

[[compliance.rules]]
id = "ticker-format"
severity = "warning"
predicate = { type = "field_pattern", field = "symbol", pattern = "^[A-Z]{1,5}$" }

[[providers]]
name = "primary"
kind = "anthropic"
model = "claude-sonnet-4-20250514"
priority = 0
timeout_ms = 20000

[[providers]]
name = "fallback"
kind = "openai"
model = "gpt-4o"
priority = 1
"#;

    let file = write_temp_config(toml);
    let config = Config::load(file.path()).expect("full config should load");

    assert_eq!(config.rate_limit.limit, 5);
    assert_eq!(config.cache.ttl_ms, 120_000);
    assert_eq!(config.fraud.min_samples, 5);
    assert_eq!(config.compliance.rules.len(), 2);
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.providers[1].kind, ProviderKind::OpenAi);
    assert_eq!(
        config.refresher.url.as_deref(),
        Some("https://reference.example.com/snapshot")
    );
}

#[test]
fn config_rejects_zero_rate_limit() {
    let toml = r#"
[rate_limit]
limit = 0

[[providers]]
name = "primary"
"#;

    let file = write_temp_config(toml);
    match Config::load(file.path()) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "rate_limit.limit",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid rate limit error, got {err}"),
        Ok(_) => panic!("Expected zero rate limit to be rejected"),
    }
}

#[test]
fn config_rejects_missing_providers() {
    let toml = r#"
[rate_limit]
limit = 10
"#;

    let file = write_temp_config(toml);
    assert!(
        matches!(
            Config::load(file.path()),
            Err(Error::Config(ConfigError::MissingField {
                field: "providers"
            }))
        ),
        "Expected missing providers to be rejected"
    );
}

#[test]
fn config_rejects_unparseable_rule_pattern() {
    let toml = r#"
[[compliance.rules]]
id = "broken"
predicate = { type = "field_pattern", field = "symbol", pattern = "([" }

[[providers]]
name = "primary"
"#;

    let file = write_temp_config(toml);
    match Config::load(file.path()) {
        Err(Error::Config(ConfigError::InvalidRule { rule, .. })) => {
            assert_eq!(rule, "broken");
        }
        Err(err) => panic!("Expected invalid rule error, got {err}"),
        Ok(_) => panic!("Expected bad pattern to be rejected"),
    }
}

#[test]
fn config_reports_missing_file() {
    let result = Config::load("/nonexistent/modelgate.toml");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}
