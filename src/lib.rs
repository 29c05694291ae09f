//! In-process HTTP request tracking.
//!
//! Every request through an instrumented axum router becomes a task. Active
//! tasks and a bounded newest-first history of completed tasks are exposed
//! through an API-key protected endpoint for an external monitoring client.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod process;
pub mod task;
pub mod tracker;

pub use admin::TrackerServer;
pub use config::schema::TrackerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use tracker::{TaskEnd, TaskStart, Tracker, TrackerError, TrackingHandle};
