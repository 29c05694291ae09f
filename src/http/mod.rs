//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer)
//!     → middleware.rs (start_task, handle into request extensions)
//!     → TimeoutLayer → application routes | tracker API
//!     → middleware.rs (end_task with the response)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{track_requests, TrackingState};
pub use server::HttpServer;
