//! Modelgate - AI-request orchestration gateway.
//!
//! This crate sits between client applications and downstream AI model
//! providers, enforcing compliance, rate limits, caching, and fraud scoring
//! before financial-analysis requests reach a provider.
//!
//! # Architecture
//!
//! Each request runs through a fixed pipeline coordinated by
//! [`gateway::Gateway`]:
//!
//! 1. **Admission** — per-caller sliding-window rate limiting
//! 2. **Validation** — declarative compliance rules, evaluated in full
//! 3. **Cache check** — fingerprint lookup with single-flight semantics
//! 4. **Fraud scoring** — z-score anomaly detection for transaction-class
//!    requests
//! 5. **Routing** — priority failover across model providers with per-call
//!    timeouts and cooldown-based recovery
//!
//! A [`service::BackgroundRefresher`] keeps the reference-data snapshot used
//! by fraud scoring and prompt construction current, off the request path.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Requests, fingerprints, outcomes, policy rules, snapshots
//! - [`error`] - Error types for the crate
//! - [`service`] - Pipeline services: limiter, validator, cache, scorer,
//!   router, refresher
//! - [`adapter`] - Outbound collaborators: model provider clients,
//!   reference-data source
//! - [`gateway`] - The request orchestrator
//!
//! # Example
//!
//! ```no_run
//! use modelgate::config::Config;
//!
//! let config = Config::load("modelgate.toml").expect("valid config");
//! config.init_logging();
//! ```

pub mod adapter;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod service;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
