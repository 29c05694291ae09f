//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use request_tracker::config::TrackerConfig;
use request_tracker::{HttpServer, Shutdown, Tracker};

pub const API_KEY: &str = "01234567789ABCDEF";

/// A tracked server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub tracker: Arc<Tracker>,
    /// Each permit lets one `/gate` request finish.
    pub gate: Arc<Semaphore>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn tracker_url(&self) -> String {
        self.url("/tracker")
    }

    /// Poll until `count` tasks are active.
    pub async fn wait_for_active(&self, count: usize) {
        for _ in 0..200 {
            if self.tracker.active_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} active tasks, found {}",
            count,
            self.tracker.active_count()
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn gated(State(gate): State<Arc<Semaphore>>) -> &'static str {
    if let Ok(permit) = gate.acquire().await {
        permit.forget();
    }
    "released"
}

pub fn test_config(max_completed_tasks: usize) -> TrackerConfig {
    let mut config = TrackerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.server.api_key = Some(API_KEY.to_string());
    config.tracker.max_completed_tasks = Some(max_completed_tasks);
    config.observability.metrics_enabled = false;
    config
}

/// Start a server with `/`, `/missing` and `/gate` routes.
pub async fn start_server(config: TrackerConfig) -> TestServer {
    let gate = Arc::new(Semaphore::new(0));
    let routes = Router::new()
        .route("/", get(|| async { "Hello world" }))
        .route("/gate", get(gated))
        .with_state(gate.clone());

    let server = HttpServer::new(config, routes).unwrap();
    let tracker = server.tracker().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        tracker,
        gate,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
