//! Profile and channel API handlers.
//!
//! This module provides HTTP REST endpoints for the CRUD and reporting
//! glue around the session lifecycle:
//! - Current-user lookup and account detail updates
//! - Avatar and cover image replacement
//! - Channel profiles with subscriber aggregates
//! - Subscription toggling and watch history
//!
//! All endpoints require an authenticated caller.

use axum::{
    Json,
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use vidhive::auth::{AuthError, PublicUser, UserId};
use vidhive::channel::{ChannelError, ChannelProfile, WatchEntry};

use super::auth::{ErrorResponse, error_response};
use super::{AppState, read_upload};

#[derive(Debug, Deserialize)]
pub struct UpdateAccountPayload {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscribed: bool,
}

/// Map a channel error to its response status and client-safe body
fn channel_error_response(err: &ChannelError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        ChannelError::ChannelNotFound(_) => StatusCode::NOT_FOUND,
        ChannelError::SelfSubscription => StatusCode::NOT_ACCEPTABLE,
        ChannelError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            message: err.client_message(),
        }),
    )
}

/// Get the authenticated user's sanitized profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<PublicUser>, (StatusCode, Json<ErrorResponse>)> {
    match state.auth_manager.current_user(user_id).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Update the authenticated user's full name and/or email.
///
/// # Errors
///
/// - `400 Bad Request`: neither field supplied
/// - `409 Conflict`: the new email belongs to another account
pub async fn update_account(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<UpdateAccountPayload>,
) -> Result<Json<PublicUser>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .auth_manager
        .update_account_details(
            user_id,
            payload.full_name.as_deref(),
            payload.email.as_deref(),
        )
        .await
    {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Replace the authenticated user's avatar.
///
/// Multipart form with a single `avatar` file field. The old asset is
/// removed from the host after the swap.
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    multipart: Multipart,
) -> Result<Json<PublicUser>, (StatusCode, Json<ErrorResponse>)> {
    let upload = single_file(multipart, "avatar").await?;

    match state.auth_manager.update_avatar(user_id, upload).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Replace the authenticated user's cover image.
///
/// Multipart form with a single `cover` file field.
pub async fn update_cover(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    multipart: Multipart,
) -> Result<Json<PublicUser>, (StatusCode, Json<ErrorResponse>)> {
    let upload = single_file(multipart, "cover").await?;

    match state.auth_manager.update_cover_image(user_id, upload).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Get a channel profile with subscriber aggregates.
pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(viewer_id): Extension<UserId>,
    Path(username): Path<String>,
) -> Result<Json<ChannelProfile>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .channel_manager
        .channel_profile(&username, viewer_id)
        .await
    {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => Err(channel_error_response(&e)),
    }
}

/// Subscribe to a channel, or unsubscribe if already subscribed.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(username): Path<String>,
) -> Result<Json<SubscriptionResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .channel_manager
        .toggle_subscription(user_id, &username)
        .await
    {
        Ok(subscribed) => Ok(Json(SubscriptionResponse { subscribed })),
        Err(e) => Err(channel_error_response(&e)),
    }
}

/// Get the authenticated user's watch history, newest first.
///
/// Accepts an optional `limit` query parameter (default 20, capped at 100).
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<WatchEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    match state.channel_manager.watch_history(user_id, limit).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => Err(channel_error_response(&e)),
    }
}

/// Read the expected single file field out of a multipart payload
async fn single_file(
    mut multipart: Multipart,
    expected: &'static str,
) -> Result<vidhive::media::Upload, (StatusCode, Json<ErrorResponse>)> {
    let malformed = || {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                code: StatusCode::BAD_REQUEST.as_u16(),
                message: "Malformed multipart payload".to_string(),
            }),
        )
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(expected) => {
                return read_upload(field).await.map_err(|_| malformed());
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => return Err(malformed()),
        }
    }

    Err(error_response(&AuthError::MissingField(expected)))
}
