//! Demo web server instrumented with request tracking.
//!
//! ```text
//!     Client Request ──▶ TraceLayer ──▶ track_requests ──▶ routes ( /, /slow )
//!                                          │                 │
//!                                          ▼                 ▼
//!                                   ┌────────────┐    ┌─────────────┐
//!                                   │  Tracker   │◀───│  /tracker   │◀── tracker-cli
//!                                   │ active +   │    │ (api-key)   │
//!                                   │ completed  │    └─────────────┘
//!                                   └────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{extract::Query, routing::get, Router};
use clap::Parser;
use serde::Deserialize;
use tokio::net::TcpListener;

use request_tracker::config::{load_config, TrackerConfig};
use request_tracker::lifecycle::{shutdown_on_signal, Shutdown};
use request_tracker::observability::{logging, metrics};
use request_tracker::HttpServer;

#[derive(Parser)]
#[command(name = "request-tracker")]
#[command(about = "Demo web server with request tracking", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long, env = "TRACKER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Deserialize)]
struct SlowParams {
    ms: Option<u64>,
}

async fn hello() -> &'static str {
    "Hello world"
}

/// Sleeps so the request shows up as active.
async fn slow(Query(params): Query<SlowParams>) -> String {
    let ms = params.ms.unwrap_or(1_000).min(10_000);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    format!("Slept {} ms", ms)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrackerConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!("request-tracker v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tracker_path = %config.server.path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let routes = Router::new()
        .route("/", get(hello))
        .route("/slow", get(slow));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, routes)?;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
