//! HTTP API for the VidHive backend.
//!
//! This module provides the REST API for the credential and session
//! service plus the profile/reporting glue around it.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework
//! - **Tower**: Middleware for CORS and request correlation
//! - **JWT**: Token-based authentication with access/refresh pairs
//!
//! # Modules
//!
//! - [`auth`]: Session lifecycle endpoints (register, login, logout,
//!   refresh, change-password)
//! - [`users`]: Profile updates, channel profiles, watch history
//! - [`middleware`]: Access-token middleware for protected endpoints
//! - [`cookies`]: Bearer-cookie helpers for the dual delivery policy
//! - [`request_id`]: Request correlation middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! GET   /health                              - Health check (public)
//! POST  /api/v1/auth/register                - Register user (public, multipart)
//! POST  /api/v1/auth/login                   - Login (public)
//! POST  /api/v1/auth/refresh                 - Exchange refresh token (public)
//! POST  /api/v1/auth/logout                  - Logout (auth required)
//! POST  /api/v1/auth/change-password         - Change password (auth required)
//! GET   /api/v1/users/me                     - Current user (auth required)
//! PATCH /api/v1/users/me                     - Update account details (auth required)
//! PATCH /api/v1/users/me/avatar              - Replace avatar (auth required, multipart)
//! PATCH /api/v1/users/me/cover               - Replace cover image (auth required, multipart)
//! GET   /api/v1/users/me/history             - Watch history (auth required)
//! GET   /api/v1/channels/{username}          - Channel profile (auth required)
//! POST  /api/v1/channels/{username}/subscribe - Toggle subscription (auth required)
//! ```
//!
//! # Security
//!
//! - Access tokens are short-lived; refresh tokens rotate on every use
//! - Tokens are delivered in the body, as `HttpOnly` cookies, or both,
//!   per the configured delivery policy
//! - Error bodies carry a status code and message, never a stack trace

pub mod auth;
pub mod cookies;
pub mod middleware;
pub mod request_id;
pub mod users;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use vidhive::{auth::AuthManager, channel::ChannelManager, media::Upload};

use crate::config::TokenDeliveryConfig;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle manager
    pub auth_manager: Arc<AuthManager>,
    /// Read-side reporting manager
    pub channel_manager: Arc<ChannelManager>,
    /// How tokens are delivered to clients
    pub token_delivery: TokenDeliveryConfig,
    /// Access-token cookie lifetime in seconds
    pub access_ttl_secs: i64,
    /// Refresh-token cookie lifetime in seconds
    pub refresh_ttl_secs: i64,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with managers
///
/// # Returns
///
/// Configured Axum router ready to serve requests
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(
            request_id::request_id_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    // Public routes (no authentication middleware). Refresh is public:
    // its credential is the refresh token itself.
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    // Protected routes (require a valid access token)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/change-password", post(auth::change_password))
        .route("/users/me", get(users::me).patch(users::update_account))
        .route("/users/me/avatar", patch(users::update_avatar))
        .route("/users/me/cover", patch(users::update_cover))
        .route("/users/me/history", get(users::watch_history))
        .route("/channels/{username}", get(users::channel_profile))
        .route(
            "/channels/{username}/subscribe",
            post(users::toggle_subscription),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Pings the user store and reports overall health with an appropriate
/// status code.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.auth_manager.health_check().await.is_ok();

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

/// Read one multipart field into an `Upload`
pub(crate) async fn read_upload(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Upload, axum::extract::multipart::MultipartError> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await?.to_vec();

    Ok(Upload {
        filename,
        content_type,
        bytes,
    })
}
