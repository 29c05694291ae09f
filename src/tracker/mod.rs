//! Request tracking subsystem.
//!
//! # Data Flow
//! ```text
//! request start
//!     → request.rs (RequestDescriptor, target resolution)
//!     → tasks.rs start_task: ignore check → id allocation → active index
//!     → TrackingHandle returned to the caller
//!
//! request end
//!     → tasks.rs end_task(handle): completion applied
//!     → active index → front of completed history (bounded)
//! ```
//!
//! # Design Decisions
//! - Counter, active index and history share one mutex
//! - Lock held only for bookkeeping; tasks are built and normalized outside it
//! - Structural misuse is returned as `TrackerError`, never swallowed
//! - No eviction for tasks that start but never end

pub mod error;
pub mod request;
pub mod tasks;

pub use error::TrackerError;
pub use request::{RequestDescriptor, ResponseDescriptor};
pub use tasks::{TaskEnd, TaskStart, Tracker, TrackingHandle, DEFAULT_MAX_COMPLETED_TASKS};
