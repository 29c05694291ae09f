//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;
use crate::task::Tags;
use crate::tracker::DEFAULT_MAX_COMPLETED_TASKS;

/// Environment variable holding the tracker API key.
pub const API_KEY_ENV: &str = "TOP_WEB_API_KEY";

/// Environment variable holding the completed history bound.
pub const MAX_COMPLETED_TASKS_ENV: &str = "TOP_MAX_COMPLETED_TASKS";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// Listener configuration for the host server.
    pub listener: ListenerConfig,

    /// Task tracking settings.
    pub tracker: TrackerSection,

    /// Tracker API endpoint settings.
    pub server: ServerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Task tracking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Completed history bound. Unset reads `TOP_MAX_COMPLETED_TASKS`.
    pub max_completed_tasks: Option<usize>,

    /// Paths that are never tracked (exact match).
    pub ignore_paths: Vec<String>,

    /// Tags attached to every task. Unset uses the process default tags.
    pub tags: Option<Tags>,

    /// Tags the middleware adds per request, overriding `tags`.
    pub request_tags: Tags,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            max_completed_tasks: None,
            ignore_paths: vec!["/tracker".to_string()],
            tags: None,
            request_tags: Tags::new(),
        }
    }
}

impl TrackerSection {
    /// Configured bound, else `TOP_MAX_COMPLETED_TASKS`, else the default.
    pub fn resolve_max_completed_tasks(&self) -> Result<usize, ConfigError> {
        if let Some(max) = self.max_completed_tasks {
            return Ok(max);
        }
        match std::env::var(MAX_COMPLETED_TASKS_ENV) {
            Ok(raw) => parse_bound(&raw).ok_or(ConfigError::InvalidEnv {
                var: MAX_COMPLETED_TASKS_ENV,
                value: raw,
            }),
            Err(_) => Ok(DEFAULT_MAX_COMPLETED_TASKS),
        }
    }
}

fn parse_bound(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Tracker API endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Mount the tracker API endpoint.
    pub enabled: bool,

    /// Path the endpoint is served on.
    pub path: String,

    /// API key. Unset reads `TOP_WEB_API_KEY`.
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/tracker".to_string(),
            api_key: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
