//! Repository trait definition and PostgreSQL implementation.
//!
//! The credential store is an external collaborator as far as the
//! session lifecycle is concerned, so all user-record access goes
//! through the [`UserRepository`] trait. The Postgres implementation
//! lives here; an in-memory one for tests and local development lives
//! in [`crate::db::memory`].

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::auth::{AuthResult, NewUser, User, UserId};

/// Trait for user/credential store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user record
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Find user by username (callers pass lowercase)
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Whether a record with this username or email already exists
    async fn username_or_email_taken(&self, username: &str, email: &str) -> AuthResult<bool>;

    /// Store a refresh token, replacing whatever was there
    async fn set_refresh_token(&self, user_id: UserId, token: &str) -> AuthResult<()>;

    /// Unset the stored refresh token
    async fn clear_refresh_token(&self, user_id: UserId) -> AuthResult<()>;

    /// Atomically replace the stored refresh token, but only if the
    /// currently stored value equals `presented`.
    ///
    /// Returns `false` when the stored value did not match, meaning the
    /// presented token was already redeemed or superseded. The compare
    /// and the overwrite are one operation, so two concurrent refreshes
    /// with the same token cannot both win.
    async fn swap_refresh_token(
        &self,
        user_id: UserId,
        presented: &str,
        next: &str,
    ) -> AuthResult<bool>;

    /// Replace the stored password hash
    async fn update_password_hash(&self, user_id: UserId, password_hash: &str) -> AuthResult<()>;

    /// Update full name and/or email, returning the fresh record
    async fn update_account_details(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> AuthResult<User>;

    /// Replace the avatar URL, returning the fresh record
    async fn update_avatar(&self, user_id: UserId, url: &str) -> AuthResult<User>;

    /// Replace the cover image URL, returning the fresh record
    async fn update_cover_image(&self, user_id: UserId, url: &str) -> AuthResult<User>;

    /// Check that the store is reachable
    async fn health_check(&self) -> AuthResult<()>;
}

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
                            cover_image_url, refresh_token, created_at";

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        password_hash: row.get("password_hash"),
        avatar_url: row.get("avatar_url"),
        cover_image_url: row.get("cover_image_url"),
        refresh_token: row.get("refresh_token"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

/// PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, full_name, password_hash, avatar_url, cover_image_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.password_hash)
        .bind(&new_user.avatar_url)
        .bind(&new_user.cover_image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT id FROM users WHERE username = $1 OR email = $2")
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn set_refresh_token(&self, user_id: UserId, token: &str) -> AuthResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_refresh_token(&self, user_id: UserId) -> AuthResult<()> {
        sqlx::query("UPDATE users SET refresh_token = NULL WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        user_id: UserId,
        presented: &str,
        next: &str,
    ) -> AuthResult<bool> {
        // Compare-and-swap in one statement; rows_affected tells us
        // whether the stored token still matched.
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $1 WHERE id = $2 AND refresh_token = $3",
        )
        .bind(next)
        .bind(user_id)
        .bind(presented)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password_hash(&self, user_id: UserId, password_hash: &str) -> AuthResult<()> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_account_details(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> AuthResult<User> {
        let row = sqlx::query(&format!(
            "UPDATE users
             SET full_name = COALESCE($1, full_name),
                 email = COALESCE($2, email)
             WHERE id = $3
             RETURNING {USER_COLUMNS}"
        ))
        .bind(full_name)
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    async fn update_avatar(&self, user_id: UserId, url: &str) -> AuthResult<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET avatar_url = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(url)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    async fn update_cover_image(&self, user_id: UserId, url: &str) -> AuthResult<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET cover_image_url = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(url)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    async fn health_check(&self) -> AuthResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
