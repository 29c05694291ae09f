//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (history bound > 0, timeouts > 0)
//! - Check addresses and paths are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrackerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::admin::MIN_API_KEY_LEN;
use crate::config::schema::TrackerConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed config for semantic errors.
pub fn validate_config(config: &TrackerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.tracker.max_completed_tasks == Some(0) {
        errors.push(ValidationError::new(
            "tracker.max_completed_tasks",
            "must be at least 1",
        ));
    }

    for path in &config.tracker.ignore_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "tracker.ignore_paths",
                format!("{:?} must start with '/'", path),
            ));
        }
    }

    if !config.server.path.starts_with('/') {
        errors.push(ValidationError::new(
            "server.path",
            format!("{:?} must start with '/'", config.server.path),
        ));
    }

    if let Some(key) = &config.server.api_key {
        if key.chars().count() < MIN_API_KEY_LEN {
            errors.push(ValidationError::new(
                "server.api_key",
                format!("must be at least {} characters long", MIN_API_KEY_LEN),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
