//! Tracker error definitions.

use thiserror::Error;

/// Structural failures from `start_task` / `end_task`.
///
/// These point at a broken integration in the calling layer, so they are
/// always returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The request target could not be resolved to a path.
    #[error("cannot handle request: unparseable url {uri:?}: {reason}")]
    UnparseableRequest { uri: String, reason: String },

    /// `end_task` was called without the handle returned by `start_task`.
    #[error("request carries no tracking handle")]
    MissingHandle,

    /// The handle refers to a task that is not active (already completed or never started).
    #[error("no active task for tracking id {0}")]
    UnknownTask(u64),
}

impl TrackerError {
    /// True for the "no active tracking" conditions raised by `end_task`.
    pub fn is_no_active_tracking(&self) -> bool {
        matches!(self, TrackerError::MissingHandle | TrackerError::UnknownTask(_))
    }
}
