//! Graceful demo service.
//!
//! Runs an HTTP listener next to periodic background workers and shuts them
//! all down together on SIGINT (or the configured signals).
//!
//! ```text
//!                ┌──────────────────────── ComponentSet ───────────────────────┐
//!   signal ───▶  │  http (axum)      ticker (spawned)      blocking-ticker     │
//!                │      start ─────────── start ─────────────── start          │
//!                │      stop  ─────────── stop  ─────────────── stop   ◀── deadline
//!                └─────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use axum::{routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};

use graceful::config::{load_config, validate_config, AppConfig, ConfigError};
use graceful::observability::{logging, metrics};
use graceful::{ComponentSet, Context, HttpServer, Ticker};

#[derive(Parser, Debug)]
#[command(name = "graceful-demo")]
#[command(about = "Run an HTTP listener and background workers with coordinated shutdown", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override graceful.shutdown_timeout_ms (0 = unbounded).
    #[arg(long)]
    shutdown_timeout_ms: Option<u64>,

    /// Override http.bind_address.
    #[arg(long)]
    bind_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(timeout_ms) = args.shutdown_timeout_ms {
        config.graceful.shutdown_timeout_ms = timeout_ms;
    }
    if let Some(bind_address) = args.bind_address {
        config.http.bind_address = bind_address;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!("graceful-demo v0.1.0 starting");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let components = build_components(&config);
    tracing::info!(
        components = ?components.names(),
        signals = ?config.graceful.signals,
        shutdown_timeout_ms = config.graceful.shutdown_timeout_ms,
        "Configuration loaded"
    );

    components
        .graceful(&Context::background(), &config.graceful)
        .await
        .inspect_err(|err| tracing::error!(error = %err, "Shutdown finished with errors"))?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_components(config: &AppConfig) -> ComponentSet {
    let mut components = ComponentSet::new();
    if config.http.enabled {
        components.push(HttpServer::from_config(&config.http, router()));
    }
    for ticker in &config.tickers {
        components.push(Ticker::from_config(ticker));
    }
    components
}

fn router() -> Router {
    Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
