//! Channel reporting data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserId;

/// Public channel view with subscription aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    /// How many users subscribe to this channel
    pub subscriber_count: i64,
    /// How many channels this user subscribes to
    pub subscribed_to_count: i64,
    /// Whether the viewing user subscribes to this channel
    pub is_subscribed: bool,
}

/// One watched-video row in a user's history, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchEntry {
    pub video_id: i64,
    pub title: String,
    pub thumbnail_url: String,
    pub owner_username: String,
    pub watched_at: DateTime<Utc>,
}
