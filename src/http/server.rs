//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the tracker and the tracker API from configuration
//! - Wrap the host application's routes with the tracking middleware
//! - Wire up timeouts and request tracing
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::TrackerServer;
use crate::config::{ConfigError, TrackerConfig};
use crate::http::middleware::{track_requests, TrackingState};
use crate::process::SystemProcessInfo;
use crate::tracker::Tracker;

/// Host application server with request tracking.
pub struct HttpServer {
    router: Router,
    config: TrackerConfig,
    tracker: Arc<Tracker>,
}

impl HttpServer {
    /// Create a server around the application's `routes`.
    ///
    /// Fails when the tracker API is enabled and no usable API key is
    /// configured, or when an environment fallback is malformed. The API path
    /// is added to the ignore list when missing.
    pub fn new(mut config: TrackerConfig, routes: Router) -> Result<Self, ConfigError> {
        if config.server.enabled && !config.tracker.ignore_paths.contains(&config.server.path) {
            config.tracker.ignore_paths.push(config.server.path.clone());
        }
        let tracker = Arc::new(Tracker::from_config(
            &config.tracker,
            Arc::new(SystemProcessInfo::new()),
        )?);
        Self::with_tracker(config, routes, tracker)
    }

    /// Create a server around an existing tracker. The tracker should ignore
    /// the API path, otherwise every query is recorded.
    pub fn with_tracker(
        config: TrackerConfig,
        routes: Router,
        tracker: Arc<Tracker>,
    ) -> Result<Self, ConfigError> {
        let api = if config.server.enabled {
            let server = TrackerServer::new(tracker.clone(), config.server.api_key.clone())?;
            if !tracker.is_ignored(&config.server.path) {
                tracing::warn!(path = %config.server.path, "Tracker API path is not ignored; queries will be tracked");
            }
            tracing::info!(path = %config.server.path, "Tracker API enabled");
            Some(server)
        } else {
            None
        };

        let router = Self::build_router(&config, routes, tracker.clone(), api);
        Ok(Self {
            router,
            config,
            tracker,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Tracking sits outside the timeout so timed-out requests still complete
    /// their task with the timeout status.
    #[allow(deprecated)]
    fn build_router(
        config: &TrackerConfig,
        routes: Router,
        tracker: Arc<Tracker>,
        api: Option<TrackerServer>,
    ) -> Router {
        let app = match api {
            Some(server) => routes.merge(server.router(&config.server.path)),
            None => routes,
        };

        let tracking = TrackingState::new(tracker, config.tracker.request_tags.clone());

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(tracking, track_requests))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(
            active_tasks = self.tracker.active_count(),
            completed_tasks = self.tracker.completed_count(),
            "HTTP server stopped"
        );
        Ok(())
    }

    /// The router, for driving the service without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
