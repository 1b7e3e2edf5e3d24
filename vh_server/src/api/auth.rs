//! Authentication API handlers.
//!
//! This module provides HTTP REST endpoints for the session lifecycle:
//! - User registration with avatar (required) and cover image (optional)
//! - Login with username or email plus password
//! - Logout to clear the stored refresh token
//! - Refresh-token exchange with rotation
//! - Password change
//!
//! All endpoints return JSON; errors carry a status code and a
//! client-safe message.
//!
//! # Examples
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8790/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "SecurePass1"}'
//! ```
//!
//! Refresh:
//! ```bash
//! curl -X POST http://localhost:8790/api/v1/auth/refresh \
//!   -H "Content-Type: application/json" \
//!   -d '{"refresh_token": "eyJhbGciOiJIUzI1NiIs..."}'
//! ```

use axum::{
    Json,
    extract::{Extension, Multipart, State},
    http::{HeaderMap, HeaderName, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use vidhive::auth::{
    AuthError, LoginRequest, PublicUser, RegisterRequest, TokenPair, UserId, UserRef,
};
use vidhive::media::Upload;

use super::cookies::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, bearer_cookie, clear_cookie, cookie_value,
};
use super::{AppState, read_upload};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordPayload {
    pub old_password: String,
    pub new_password: String,
    /// Optional handle fallback; the authenticated caller is used when absent
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Map a lifecycle error to its response status and client-safe body
pub(super) fn error_response(err: &AuthError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        AuthError::MissingField(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::InvalidToken
        | AuthError::MissingRefreshToken
        | AuthError::RefreshTokenSuperseded => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::IdentityTaken => StatusCode::CONFLICT,
        AuthError::PasswordReused => StatusCode::NOT_ACCEPTABLE,
        AuthError::Upload(_) => StatusCode::BAD_REQUEST,
        AuthError::Database(_)
        | AuthError::HashingFailed
        | AuthError::Jwt(_)
        | AuthError::TokenConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            message: err.client_message(),
        }),
    )
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            code: StatusCode::BAD_REQUEST.as_u16(),
            message: message.to_string(),
        }),
    )
}

/// Set-Cookie headers for a token pair, per the delivery policy
fn token_cookies(state: &AppState, pair: &TokenPair) -> Vec<(HeaderName, String)> {
    if !state.token_delivery.as_cookie {
        return Vec::new();
    }

    vec![
        (
            SET_COOKIE,
            bearer_cookie(ACCESS_TOKEN_COOKIE, &pair.access_token, state.access_ttl_secs),
        ),
        (
            SET_COOKIE,
            bearer_cookie(
                REFRESH_TOKEN_COOKIE,
                &pair.refresh_token,
                state.refresh_ttl_secs,
            ),
        ),
    ]
}

/// Set-Cookie headers that clear both bearer cookies
fn clearing_cookies(state: &AppState) -> Vec<(HeaderName, String)> {
    if !state.token_delivery.as_cookie {
        return Vec::new();
    }

    vec![
        (SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE)),
        (SET_COOKIE, clear_cookie(REFRESH_TOKEN_COOKIE)),
    ]
}

/// Tokens for the response body, per the delivery policy
fn body_tokens(state: &AppState, pair: TokenPair) -> (Option<String>, Option<String>) {
    if state.token_delivery.in_body {
        (Some(pair.access_token), Some(pair.refresh_token))
    } else {
        (None, None)
    }
}

/// Register a new user account.
///
/// Multipart form: text fields `username`, `email`, `full_name`,
/// `password`; file fields `avatar` (required) and `cover` (optional).
///
/// # Response
///
/// On success, returns `201 Created` with the sanitized user. The
/// password hash and refresh token are never present in the body.
///
/// # Errors
///
/// - `400 Bad Request`: missing/blank field, weak password, or the
///   asset host rejected an upload
/// - `409 Conflict`: username or email already registered
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, Json<ErrorResponse>)> {
    let mut username = String::new();
    let mut email = String::new();
    let mut full_name = String::new();
    let mut password = String::new();
    let mut avatar: Option<Upload> = None;
    let mut cover: Option<Upload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return Err(bad_request("Malformed multipart payload")),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => {
                username = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed multipart payload"))?;
            }
            "email" => {
                email = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed multipart payload"))?;
            }
            "full_name" => {
                full_name = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed multipart payload"))?;
            }
            "password" => {
                password = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed multipart payload"))?;
            }
            "avatar" => {
                avatar = Some(
                    read_upload(field)
                        .await
                        .map_err(|_| bad_request("Malformed multipart payload"))?,
                );
            }
            "cover" => {
                cover = Some(
                    read_upload(field)
                        .await
                        .map_err(|_| bad_request("Malformed multipart payload"))?,
                );
            }
            _ => {}
        }
    }

    let Some(avatar) = avatar else {
        metrics::registrations_total(false);
        return Err(error_response(&AuthError::MissingField("avatar")));
    };

    let request = RegisterRequest {
        username,
        email,
        full_name,
        password,
    };

    match state.auth_manager.register(request, avatar, cover).await {
        Ok(user) => {
            metrics::registrations_total(true);
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) => {
            metrics::registrations_total(false);
            Err(error_response(&e))
        }
    }
}

/// Authenticate a user and issue a token pair.
///
/// Overwrites the stored refresh token, so any previously issued
/// refresh token for this user stops working immediately.
///
/// # Response
///
/// On success, returns `200 OK` with the sanitized user and, per the
/// delivery policy, the tokens in the body and/or as `HttpOnly` cookies.
///
/// # Errors
///
/// - `400 Bad Request`: neither username nor email supplied
/// - `401 Unauthorized`: wrong password
/// - `404 Not Found`: no such user
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> Response {
    let request = LoginRequest {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };

    match state.auth_manager.login(request).await {
        Ok((user, pair)) => {
            metrics::logins_total(true);
            let cookies = token_cookies(&state, &pair);
            let (access_token, refresh_token) = body_tokens(&state, pair);

            (
                StatusCode::OK,
                AppendHeaders(cookies),
                Json(AuthResponse {
                    user,
                    access_token,
                    refresh_token,
                }),
            )
                .into_response()
        }
        Err(e) => {
            metrics::logins_total(false);
            crate::logging::log_auth_event("failed_login", None, &e.client_message());
            error_response(&e).into_response()
        }
    }
}

/// Logout and clear the stored refresh token.
///
/// Afterwards no previously issued refresh token can be redeemed. Both
/// bearer cookies are cleared when cookie delivery is enabled.
pub async fn logout(State(state): State<AppState>, Extension(user_id): Extension<UserId>) -> Response {
    match state.auth_manager.logout(user_id).await {
        Ok(()) => (
            StatusCode::OK,
            AppendHeaders(clearing_cookies(&state)),
            Json(MessageResponse {
                message: "Logged out".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Exchange a refresh token for a fresh, rotated token pair.
///
/// The token is read from the request body, falling back to the
/// refresh-token cookie. The presented token is spent by this call:
/// presenting it a second time fails.
///
/// # Errors
///
/// Every failure (missing token, bad signature, expiry, unknown
/// subject, superseded token) is the same `401 Unauthorized` response,
/// so callers cannot probe which check failed.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshPayload>>,
) -> Response {
    let presented = payload
        .and_then(|Json(p)| p.refresh_token)
        .or_else(|| cookie_value(&headers, REFRESH_TOKEN_COOKIE))
        .unwrap_or_default();

    match state.auth_manager.refresh(&presented).await {
        Ok(pair) => {
            metrics::refreshes_total(true);
            let cookies = token_cookies(&state, &pair);
            let (access_token, refresh_token) = body_tokens(&state, pair);

            (
                StatusCode::OK,
                AppendHeaders(cookies),
                Json(TokenResponse {
                    access_token,
                    refresh_token,
                }),
            )
                .into_response()
        }
        Err(e) => {
            metrics::refreshes_total(false);
            crate::logging::log_auth_event("failed_refresh", None, &e.client_message());

            // Store failures stay 500; every token failure collapses to 401.
            let status = match e {
                AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            };
            (
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    message: if status == StatusCode::UNAUTHORIZED {
                        "Invalid refresh token".to_string()
                    } else {
                        e.client_message()
                    },
                }),
            )
                .into_response()
        }
    }
}

/// Change the caller's password.
///
/// Uses the authenticated caller by default; a `username`/`email`
/// fallback is accepted for clients that resolve the account
/// explicitly. The new password must differ from the old one.
///
/// # Errors
///
/// - `401 Unauthorized`: old password mismatch
/// - `406 Not Acceptable`: new password equals the old one
/// - `400 Bad Request`: new password fails the strength rules
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let identity = match payload.username.or(payload.email) {
        Some(handle) if !handle.trim().is_empty() => UserRef::NameOrEmail(handle),
        _ => UserRef::Id(user_id),
    };

    match state
        .auth_manager
        .change_password(identity, &payload.old_password, &payload.new_password)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Password changed".to_string(),
        })),
        Err(e) => Err(error_response(&e)),
    }
}
