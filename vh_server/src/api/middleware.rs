//! Authentication middleware for protected endpoints.
//!
//! Extracts and validates the JWT access token from the
//! `Authorization: Bearer` header, falling back to the access-token
//! cookie, then injects the authenticated user ID into request
//! extensions for downstream handlers.
//!
//! # Extracting User ID
//!
//! In handler functions, extract the user ID from request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//!
//! async fn protected_handler(Extension(user_id): Extension<i64>) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AppState;
use super::cookies::{ACCESS_TOKEN_COOKIE, cookie_value};

/// Authentication middleware that validates access tokens and injects user ID.
///
/// # Behavior
///
/// - **Success**: Token valid → Injects `user_id: i64` into request extensions
/// - **Missing header and cookie**: Returns `401 Unauthorized`
/// - **Invalid/expired token**: Returns `401 Unauthorized`
///
/// Every failure is the same bare 401; which check failed is not leaked.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let token = match bearer.or_else(|| cookie_value(request.headers(), ACCESS_TOKEN_COOKIE)) {
        Some(t) => t,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match state.auth_manager.token_issuer().verify_access_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims.sub);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
