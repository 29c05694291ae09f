//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TrackerConfig (validated, immutable)
//!     → environment fallbacks resolved at construction
//!       (TOP_MAX_COMPLETED_TASKS, TOP_WEB_API_KEY)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig, TrackerConfig,
    TrackerSection, API_KEY_ENV, MAX_COMPLETED_TASKS_ENV,
};
