//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::admin::MIN_API_KEY_LEN;
use crate::config::schema::{TrackerConfig, API_KEY_ENV};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration and startup checks.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("API key not set for the tracker server. Please set {} environment variable", API_KEY_ENV)]
    MissingApiKey,

    #[error("API key is too weak. It must be at least {} characters long", MIN_API_KEY_LEN)]
    WeakApiKey,

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<TrackerConfig, ConfigError> {
    let config: TrackerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<TrackerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "Configuration file loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [tracker]
            max_completed_tasks = 50
            ignore_paths = ["/tracker", "/health"]

            [tracker.tags]
            "service.name" = "shop"

            [tracker.request_tags]
            "deployment.zone" = "eu-1"

            [server]
            path = "/tracker"
            api_key = "0123456789ABCDEF"

            [observability]
            metrics_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.tracker.max_completed_tasks, Some(50));
        assert_eq!(config.tracker.ignore_paths.len(), 2);
        assert_eq!(
            config.tracker.tags.as_ref().and_then(|t| t.get("service.name")).map(String::as_str),
            Some("shop")
        );
        assert_eq!(
            config.tracker.request_tags.get("deployment.zone").map(String::as_str),
            Some("eu-1")
        );
        assert_eq!(config.server.api_key.as_deref(), Some("0123456789ABCDEF"));
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse_config("[tracker"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("[server]\napi_key = \"weak\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.api_key"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/tracker.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
