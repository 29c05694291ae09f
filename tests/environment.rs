//! Environment fallbacks. Kept in one test so variables are never
//! mutated concurrently.

use std::sync::Arc;

use request_tracker::config::{ConfigError, TrackerSection, API_KEY_ENV, MAX_COMPLETED_TASKS_ENV};
use request_tracker::tracker::DEFAULT_MAX_COMPLETED_TASKS;
use request_tracker::{Tracker, TrackerServer};

#[test]
fn test_environment_fallbacks() {
    let tracker = Arc::new(Tracker::with_defaults());

    // API key
    std::env::remove_var(API_KEY_ENV);
    assert!(matches!(
        TrackerServer::new(tracker.clone(), None),
        Err(ConfigError::MissingApiKey)
    ));

    std::env::set_var(API_KEY_ENV, "tooshort");
    assert!(matches!(
        TrackerServer::new(tracker.clone(), None),
        Err(ConfigError::WeakApiKey)
    ));

    std::env::set_var(API_KEY_ENV, "0123456789ABCDEF");
    assert!(TrackerServer::new(tracker.clone(), None).is_ok());

    // An explicit key is used even when the environment has one.
    assert!(matches!(
        TrackerServer::new(tracker.clone(), Some("short".into())),
        Err(ConfigError::WeakApiKey)
    ));
    std::env::remove_var(API_KEY_ENV);

    // History bound
    let section = TrackerSection::default();
    std::env::remove_var(MAX_COMPLETED_TASKS_ENV);
    assert_eq!(
        section.resolve_max_completed_tasks().unwrap(),
        DEFAULT_MAX_COMPLETED_TASKS
    );

    std::env::set_var(MAX_COMPLETED_TASKS_ENV, "50");
    assert_eq!(section.resolve_max_completed_tasks().unwrap(), 50);

    std::env::set_var(MAX_COMPLETED_TASKS_ENV, "many");
    assert!(matches!(
        section.resolve_max_completed_tasks(),
        Err(ConfigError::InvalidEnv { .. })
    ));
    std::env::remove_var(MAX_COMPLETED_TASKS_ENV);
}
