//! Channel reporting manager implementation.

use std::sync::Arc;

use sqlx::{PgPool, Row};

use super::errors::{ChannelError, ChannelResult};
use super::models::{ChannelProfile, WatchEntry};
use crate::auth::UserId;

/// Channel reporting manager
#[derive(Clone)]
pub struct ChannelManager {
    pool: Arc<PgPool>,
}

impl ChannelManager {
    /// Create a new channel manager
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Fetch a channel profile with subscription aggregates
    ///
    /// # Arguments
    ///
    /// * `username` - Channel username (lowercase)
    /// * `viewer_id` - The requesting user, for the `is_subscribed` flag
    ///
    /// # Errors
    ///
    /// * `ChannelError::ChannelNotFound` - no user with this username
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: UserId,
    ) -> ChannelResult<ChannelProfile> {
        let username = username.trim().to_lowercase();

        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar_url, u.cover_image_url,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                       AS subscriber_count,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                       AS subscribed_to_count,
                   EXISTS(SELECT 1 FROM subscriptions s
                          WHERE s.channel_id = u.id AND s.subscriber_id = $2)
                       AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(&username)
        .bind(viewer_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(ChannelError::ChannelNotFound(username))?;

        Ok(ChannelProfile {
            id: row.get("id"),
            username: row.get("username"),
            full_name: row.get("full_name"),
            avatar_url: row.get("avatar_url"),
            cover_image_url: row.get("cover_image_url"),
            subscriber_count: row.get("subscriber_count"),
            subscribed_to_count: row.get("subscribed_to_count"),
            is_subscribed: row.get("is_subscribed"),
        })
    }

    /// Subscribe to a channel if not subscribed, otherwise unsubscribe
    ///
    /// Returns the new subscription state: `true` when now subscribed.
    ///
    /// # Errors
    ///
    /// * `ChannelError::ChannelNotFound` - no user with this username
    /// * `ChannelError::SelfSubscription` - caller is the channel owner
    pub async fn toggle_subscription(
        &self,
        subscriber_id: UserId,
        channel_username: &str,
    ) -> ChannelResult<bool> {
        let channel_username = channel_username.trim().to_lowercase();

        let channel_id: UserId = sqlx::query("SELECT id FROM users WHERE username = $1")
            .bind(&channel_username)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(ChannelError::ChannelNotFound(channel_username))?
            .get("id");

        if channel_id == subscriber_id {
            return Err(ChannelError::SelfSubscription);
        }

        let deleted = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(self.pool.as_ref())
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO subscriptions (subscriber_id, channel_id) VALUES ($1, $2)")
            .bind(subscriber_id)
            .bind(channel_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(true)
    }

    /// Fetch a user's watch history, newest first
    ///
    /// # Arguments
    ///
    /// * `user_id` - User whose history to read
    /// * `limit` - Maximum rows to return
    pub async fn watch_history(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> ChannelResult<Vec<WatchEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT w.video_id, v.title, v.thumbnail_url, o.username AS owner_username,
                   w.watched_at
            FROM watch_events w
            JOIN videos v ON v.id = w.video_id
            JOIN users o ON o.id = v.owner_id
            WHERE w.user_id = $1
            ORDER BY w.watched_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .iter()
            .map(|row| WatchEntry {
                video_id: row.get("video_id"),
                title: row.get("title"),
                thumbnail_url: row.get("thumbnail_url"),
                owner_username: row.get("owner_username"),
                watched_at: row.get::<chrono::NaiveDateTime, _>("watched_at").and_utc(),
            })
            .collect())
    }
}
