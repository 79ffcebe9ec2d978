use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use modelgate::adapter::{self, HttpReferenceSource};
use modelgate::config::Config;
use modelgate::domain::{OperationType, Outcome, RejectReason, Request, RequestId};
use modelgate::error::Result;
use modelgate::gateway::Gateway;
use modelgate::service::{BackgroundRefresher, ModelRouter, SnapshotStore};

/// AI-request orchestration gateway. Reads newline-delimited JSON requests
/// on stdin and writes one JSON outcome per line on stdout.
#[derive(Parser)]
#[command(name = "modelgate", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "modelgate.toml")]
    config: PathBuf,
}

#[derive(Deserialize)]
struct IngressRequest {
    caller: String,
    operation: OperationType,
    #[serde(default)]
    payload: serde_json::Map<String, serde_json::Value>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!("modelgate starting");

    let cancel = CancellationToken::new();

    tokio::select! {
        result = serve(config, cancel.clone()) => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                cancel.cancel();
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            cancel.cancel();
        }
    }

    info!("modelgate stopped");
}

async fn serve(config: Config, cancel: CancellationToken) -> Result<()> {
    let mut endpoints = Vec::with_capacity(config.providers.len());
    for provider in &config.providers {
        let client = adapter::build_client(provider)?;
        endpoints.push((provider.clone(), client));
    }
    let router = Arc::new(ModelRouter::new(endpoints, &config.router));
    let snapshots = Arc::new(SnapshotStore::new());
    let gateway = Arc::new(Gateway::new(&config, router, snapshots.clone())?);

    if let Some(url) = &config.refresher.url {
        let source = Arc::new(HttpReferenceSource::new(url));
        let refresher = BackgroundRefresher::new(source, snapshots, &config.refresher)
            .with_cache_sweep(gateway.cache().clone());
        tokio::spawn(refresher.run(cancel.clone()));
        info!(url = %url, "Reference refresher started");
    } else {
        info!("No reference source configured; snapshot stays empty");
    }

    info!("Listening for requests on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut inflight = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        // Each request is its own unit of concurrency
        let gateway = gateway.clone();
        inflight.spawn(async move {
            println!("{}", handle_line(&gateway, &line).await);
        });
    }

    // Every request read before EOF still gets its outcome written
    while inflight.join_next().await.is_some() {}

    Ok(())
}

async fn handle_line(gateway: &Gateway, line: &str) -> String {
    let ingress: IngressRequest = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            return json!({
                "status": "invalid_request",
                "error": e.to_string(),
            })
            .to_string()
        }
    };

    let request = Request::new(ingress.caller, ingress.operation, ingress.payload);
    let request_id = request.id();
    let outcome = gateway.submit(request).await;
    render_outcome(request_id, &outcome).to_string()
}

fn render_outcome(id: RequestId, outcome: &Outcome) -> serde_json::Value {
    let mut rendered = json!({
        "request_id": id.to_string(),
        "status": outcome.reason_code(),
    });
    match outcome {
        Outcome::Completed {
            response,
            cached,
            warnings,
        } => {
            rendered["response"] = json!(response);
            rendered["cached"] = json!(cached);
            if !warnings.is_empty() {
                rendered["warnings"] =
                    json!(warnings.iter().map(|w| w.as_str()).collect::<Vec<_>>());
            }
        }
        Outcome::Rejected(RejectReason::RateLimited { retry_after }) => {
            rendered["retry_after_ms"] = json!(retry_after.as_millis() as u64);
        }
        Outcome::Rejected(RejectReason::ComplianceViolation { violations }) => {
            rendered["violations"] =
                json!(violations.iter().map(|v| v.as_str()).collect::<Vec<_>>());
        }
        Outcome::Rejected(RejectReason::SuspectedFraud { confidence }) => {
            rendered["confidence"] = json!(confidence);
        }
        Outcome::Failed(_) => {}
    }
    rendered
}
