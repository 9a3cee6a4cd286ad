//! Structured logging setup.
//!
//! The engine library logs through the `log` facade; the subscriber installed
//! here also receives those records.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are taken from `RUST_LOG`, defaulting to
/// `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use tp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use tp_server::logging::log_security_event;
///
/// log_security_event("invalid_token", None, "Bearer token rejected");
/// ```
pub fn log_security_event(event_type: &str, user_id: Option<i64>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        "SECURITY: {}",
        message
    );
}

/// Log a completed room operation
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `user_id` - Calling user
/// * `room_id` - Affected room, when known
/// * `outcome` - `ok` or the error kind
pub fn log_room_operation(operation: &str, user_id: i64, room_id: Option<i64>, outcome: &str) {
    tracing::info!(
        operation = operation,
        user_id = user_id,
        room_id = room_id,
        outcome = outcome,
        "Room operation completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("test_event", Some(1), "Test message");
    }

    #[test]
    fn test_log_room_operation() {
        log_room_operation("join_public", 7, Some(3), "ok");
        log_room_operation("leave", 7, None, "not_found");
    }
}
