//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracker_tasks_started_total` (counter)
//! - `tracker_tasks_ignored_total` (counter)
//! - `tracker_tasks_completed_total` (counter)
//! - `tracker_active_tasks` (gauge): size of the active index
//! - `tracker_completed_tasks` (gauge): size of the completed history
//! - `tracker_api_requests_total` (counter): tracker API queries by status
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_task_started(active: usize) {
    counter!("tracker_tasks_started_total").increment(1);
    gauge!("tracker_active_tasks").set(active as f64);
}

pub fn record_task_ignored() {
    counter!("tracker_tasks_ignored_total").increment(1);
}

pub fn record_task_completed(active: usize, completed: usize) {
    counter!("tracker_tasks_completed_total").increment(1);
    gauge!("tracker_active_tasks").set(active as f64);
    gauge!("tracker_completed_tasks").set(completed as f64);
}

pub fn record_api_request(status: u16) {
    counter!("tracker_api_requests_total", "status" => status.to_string()).increment(1);
}
