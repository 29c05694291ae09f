//! Tracker API for the external monitoring client.
//!
//! A single endpoint, GET only, guarded by an `api-key` query parameter.
//! The `action` parameter selects `active_tasks` or `completed_tasks`.
//! The data contains request parameters and client addresses, so the key
//! must be kept private.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::any, Router};

use crate::config::{ConfigError, API_KEY_ENV};
use crate::tracker::Tracker;

pub use self::auth::{ApiRejection, ACTION_REJECTED_STATUS};
pub use self::handlers::{tracker_handler, Action, ActiveTasksResponse, CompletedTasksResponse};

/// Minimum accepted API key length.
pub const MIN_API_KEY_LEN: usize = 16;

/// Serves read-only views of a shared [`Tracker`].
#[derive(Clone)]
pub struct TrackerServer {
    api_key: Arc<str>,
    tracker: Arc<Tracker>,
}

impl std::fmt::Debug for TrackerServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerServer")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl TrackerServer {
    /// Create a server. Without an explicit key, `TOP_WEB_API_KEY` is read.
    ///
    /// Fails when no key is available or the key is shorter than
    /// [`MIN_API_KEY_LEN`] characters.
    pub fn new(tracker: Arc<Tracker>, api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = match api_key.filter(|k| !k.is_empty()) {
            Some(key) => key,
            None => std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or(ConfigError::MissingApiKey)?,
        };

        if api_key.chars().count() < MIN_API_KEY_LEN {
            return Err(ConfigError::WeakApiKey);
        }

        Ok(Self {
            api_key: api_key.into(),
            tracker,
        })
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Router serving the API on `path`. Any method is routed so that
    /// non-GET queries get the API's own rejection.
    pub fn router(self, path: &str) -> Router {
        Router::new()
            .route(path, any(tracker_handler))
            .with_state(self)
    }
}
