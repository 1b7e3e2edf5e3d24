//! VidHive HTTP API server library.
//!
//! Exposes the router, configuration, and observability modules so
//! integration tests can assemble the server without a running binary.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
