//! Prometheus metrics for monitoring server health and performance.
//!
//! This module provides metrics collection and export via a dedicated
//! scrape listener. Metrics are exposed in Prometheus text format.

#![allow(dead_code)] // Public API for future integration

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a registration attempt
pub fn registrations_total(success: bool) {
    metrics::counter!("auth_registrations_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record a login attempt
pub fn logins_total(success: bool) {
    metrics::counter!("auth_logins_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record a refresh-token exchange attempt
pub fn refreshes_total(success: bool) {
    metrics::counter!("auth_refreshes_total",
        "success" => success.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_do_not_panic_without_exporter() {
        http_requests_total("POST", "/api/v1/auth/login", 200);
        registrations_total(true);
        logins_total(false);
        refreshes_total(true);
    }
}
