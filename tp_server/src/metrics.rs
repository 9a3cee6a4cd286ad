//! Prometheus metrics for the room server.
//!
//! Metrics are exposed in Prometheus text format at `http://<addr>/metrics`
//! once [`init_metrics`] has installed the exporter. Without an exporter the
//! recording functions are no-ops.
//!
//! # Metrics Categories
//!
//! - **Room Metrics**: Operations by name and outcome, games started, pot sizes
//! - **WebSocket Metrics**: Active connections, events pushed

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Record a room operation with its outcome (`ok` or an error kind).
pub fn room_operations_total(operation: &'static str, outcome: &'static str) {
    metrics::counter!("room_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Increment games started counter.
pub fn games_started_total() {
    metrics::counter!("games_started_total").increment(1);
}

/// Record pot size distribution.
pub fn pot_size(size: i64) {
    metrics::histogram!("pot_size").record(size as f64);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Track an opened (`+1`) or closed (`-1`) WebSocket connection.
pub fn websocket_connections_active(delta: f64) {
    metrics::gauge!("websocket_connections_active").increment(delta);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket events pushed counter.
pub fn websocket_events_sent() {
    metrics::counter!("websocket_events_sent").increment(1);
}
