//! Structured logging configuration.
//!
//! This module provides structured logging with request correlation and
//! auth event tracking.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var; sqlx and
/// hyper are quieted by default.
///
/// # Example
///
/// ```no_run
/// use vh_server::logging;
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
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log an authentication event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of auth event (e.g. "failed_login")
/// * `user_id` - Optional user ID
/// * `message` - Event message
pub fn log_auth_event(event_type: &str, user_id: Option<i64>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        "AUTH: {}",
        message
    );
}

/// Log API request/response
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
#[allow(dead_code)]
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    tracing::info!(
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_auth_event() {
        // Just ensure it doesn't panic
        log_auth_event("failed_login", Some(1), "Invalid password attempt");
        log_auth_event("stale_refresh", None, "Superseded token presented");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/v1/users/me", 200, 45);
        log_api_request("POST", "/api/v1/auth/login", 401, 120);
    }
}
