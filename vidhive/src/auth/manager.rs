//! Session lifecycle orchestration.
//!
//! This manager owns the rules for how credentials are verified, how
//! token pairs are minted, rotated, and invalidated, and the invariants
//! that hold across registration, login, logout, refresh, and password
//! change. Storage and media hosting are external collaborators behind
//! the [`UserRepository`] and [`AssetStore`] traits.

use std::sync::Arc;

use log::{debug, warn};

use super::errors::{AuthError, AuthResult};
use super::models::{
    LoginRequest, NewUser, PublicUser, RegisterRequest, TokenPair, User, UserId, UserRef,
};
use super::password;
use super::tokens::TokenIssuer;
use crate::db::UserRepository;
use crate::media::{AssetStore, Upload};

/// Session lifecycle manager
#[derive(Clone)]
pub struct AuthManager {
    store: Arc<dyn UserRepository>,
    assets: Arc<dyn AssetStore>,
    issuer: TokenIssuer,
    pepper: String,
    rotate_sessions_on_password_change: bool,
}

impl AuthManager {
    /// Create a new session lifecycle manager
    ///
    /// # Arguments
    ///
    /// * `store` - User record store
    /// * `assets` - Asset host for avatar and cover uploads
    /// * `issuer` - Token issuer with the process-wide signing secrets
    /// * `pepper` - Server-side pepper for password hashing
    pub fn new(
        store: Arc<dyn UserRepository>,
        assets: Arc<dyn AssetStore>,
        issuer: TokenIssuer,
        pepper: String,
    ) -> Self {
        Self {
            store,
            assets,
            issuer,
            pepper,
            rotate_sessions_on_password_change: true,
        }
    }

    /// Control whether a password change also clears the stored refresh
    /// token (default: true).
    pub fn with_session_rotation(mut self, rotate: bool) -> Self {
        self.rotate_sessions_on_password_change = rotate;
        self
    }

    /// Access the token issuer, e.g. for request middleware
    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Check that the underlying store is reachable
    pub async fn health_check(&self) -> AuthResult<()> {
        self.store.health_check().await
    }

    /// Register a new user
    ///
    /// The avatar is mandatory; the cover image is optional. Exactly one
    /// durable record is created, and the returned view never carries
    /// the password hash or refresh token.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingField` - a text field is empty after trimming
    /// * `AuthError::WeakPassword` - password fails the strength rules
    /// * `AuthError::IdentityTaken` - username or email already registered
    /// * `AuthError::Upload` - the asset host failed or rejected an upload
    pub async fn register(
        &self,
        request: RegisterRequest,
        avatar: Upload,
        cover: Option<Upload>,
    ) -> AuthResult<PublicUser> {
        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();
        let full_name = request.full_name.trim().to_string();

        if username.is_empty() {
            return Err(AuthError::MissingField("username"));
        }
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if full_name.is_empty() {
            return Err(AuthError::MissingField("full_name"));
        }
        if request.password.trim().is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        password::validate_strength(&request.password)?;

        if self.store.username_or_email_taken(&username, &email).await? {
            return Err(AuthError::IdentityTaken);
        }

        let avatar_asset = self.assets.upload(avatar).await?;

        let cover_url = match cover {
            Some(cover) => match self.assets.upload(cover).await {
                Ok(asset) => Some(asset.url),
                Err(e) => {
                    // Don't leave the avatar orphaned on the host.
                    if let Err(del) = self.assets.delete(&avatar_asset.asset_id).await {
                        warn!("Failed to delete orphaned avatar asset: {}", del);
                    }
                    return Err(e.into());
                }
            },
            None => None,
        };

        let password_hash = password::hash_password(&request.password, &self.pepper)?;

        let user = self
            .store
            .create_user(NewUser {
                username,
                email,
                full_name,
                password_hash,
                avatar_url: avatar_asset.url,
                cover_image_url: cover_url,
            })
            .await?;

        debug!("Registered user {} ({})", user.username, user.id);
        Ok(user.to_public())
    }

    /// Login with username or email plus password
    ///
    /// On success the stored refresh token is overwritten with the new
    /// one, which invalidates every previously issued refresh token for
    /// this identity: there is at most one valid refresh token per user
    /// at any time.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingField` - neither username nor email supplied
    /// * `AuthError::UserNotFound` - no matching record
    /// * `AuthError::InvalidCredentials` - password mismatch
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(PublicUser, TokenPair)> {
        let user = self.resolve_by_handles(&request.username, &request.email).await?;

        password::verify_password(&request.password, &self.pepper, &user.password_hash)?;

        let pair = self.mint_pair(user.id)?;
        self.store.set_refresh_token(user.id, &pair.refresh_token).await?;

        debug!("User {} logged in", user.id);
        Ok((user.to_public(), pair))
    }

    /// Exchange a refresh token for a fresh token pair
    ///
    /// The presented token must byte-equal the one currently stored on
    /// the record; the check and the replacement happen in a single
    /// conditional store update, so each refresh token is redeemable at
    /// most once even under concurrent requests.
    ///
    /// All failure variants here normalize to one 401 response at the
    /// API layer; the distinctions exist for internal diagnostics.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingRefreshToken` - empty token
    /// * `AuthError::InvalidToken` - bad signature or expired
    /// * `AuthError::UserNotFound` - subject no longer exists
    /// * `AuthError::RefreshTokenSuperseded` - token already redeemed or
    ///   replaced by a later login/refresh
    pub async fn refresh(&self, presented: &str) -> AuthResult<TokenPair> {
        if presented.is_empty() {
            return Err(AuthError::MissingRefreshToken);
        }

        let claims = self.issuer.verify_refresh_token(presented)?;

        let user = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let pair = self.mint_pair(user.id)?;

        let rotated = self
            .store
            .swap_refresh_token(user.id, presented, &pair.refresh_token)
            .await?;
        if !rotated {
            warn!("Stale refresh token presented for user {}", user.id);
            return Err(AuthError::RefreshTokenSuperseded);
        }

        debug!("Rotated refresh token for user {}", user.id);
        Ok(pair)
    }

    /// Logout by clearing the stored refresh token
    ///
    /// Unconditional for an authenticated caller; afterwards no
    /// previously issued refresh token can be redeemed.
    pub async fn logout(&self, user_id: UserId) -> AuthResult<()> {
        self.store.clear_refresh_token(user_id).await?;
        debug!("User {} logged out", user_id);
        Ok(())
    }

    /// Change a user's password
    ///
    /// Resolves the identity by id first, falling back to
    /// username/email. The new password must differ from the old one.
    /// When session rotation is enabled (the default) the stored refresh
    /// token is cleared as well, so existing sessions cannot outlive the
    /// old credential.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - identity did not resolve
    /// * `AuthError::InvalidCredentials` - old password mismatch
    /// * `AuthError::PasswordReused` - new password equals the old one
    /// * `AuthError::WeakPassword` - new password fails the strength rules
    pub async fn change_password(
        &self,
        identity: UserRef,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self.resolve(identity).await?;

        password::verify_password(old_password, &self.pepper, &user.password_hash)?;

        if password::verify_password(new_password, &self.pepper, &user.password_hash).is_ok() {
            return Err(AuthError::PasswordReused);
        }

        password::validate_strength(new_password)?;

        let new_hash = password::hash_password(new_password, &self.pepper)?;
        self.store.update_password_hash(user.id, &new_hash).await?;

        if self.rotate_sessions_on_password_change {
            self.store.clear_refresh_token(user.id).await?;
        }

        debug!("Password changed for user {}", user.id);
        Ok(())
    }

    /// Fetch the sanitized view of an existing user
    pub async fn current_user(&self, user_id: UserId) -> AuthResult<PublicUser> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.to_public())
    }

    /// Update full name and/or email
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingField` - neither field supplied
    /// * `AuthError::IdentityTaken` - the new email belongs to another user
    pub async fn update_account_details(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> AuthResult<PublicUser> {
        let full_name = full_name.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());

        if full_name.is_none() && email.is_none() {
            return Err(AuthError::MissingField("full_name or email"));
        }

        if let Some(email) = email {
            if let Some(existing) = self.store.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AuthError::IdentityTaken);
                }
            }
        }

        let user = self
            .store
            .update_account_details(user_id, full_name, email)
            .await?;
        Ok(user.to_public())
    }

    /// Replace a user's avatar
    ///
    /// Uploads the new asset first, then swaps the URL; the old asset is
    /// deleted from the host best-effort afterwards.
    pub async fn update_avatar(&self, user_id: UserId, upload: Upload) -> AuthResult<PublicUser> {
        let old = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let asset = self.assets.upload(upload).await?;
        let user = self.store.update_avatar(user_id, &asset.url).await?;

        if let Some(old_id) = crate::media::asset_id_from_url(&old.avatar_url) {
            if let Err(e) = self.assets.delete(&old_id).await {
                warn!("Failed to delete replaced avatar asset: {}", e);
            }
        }

        Ok(user.to_public())
    }

    /// Replace a user's cover image
    pub async fn update_cover_image(
        &self,
        user_id: UserId,
        upload: Upload,
    ) -> AuthResult<PublicUser> {
        let old = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let asset = self.assets.upload(upload).await?;
        let user = self.store.update_cover_image(user_id, &asset.url).await?;

        if let Some(old_url) = old.cover_image_url {
            if let Some(old_id) = crate::media::asset_id_from_url(&old_url) {
                if let Err(e) = self.assets.delete(&old_id).await {
                    warn!("Failed to delete replaced cover asset: {}", e);
                }
            }
        }

        Ok(user.to_public())
    }

    fn mint_pair(&self, user_id: UserId) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issuer.issue_access_token(user_id)?,
            refresh_token: self.issuer.issue_refresh_token(user_id)?,
        })
    }

    async fn resolve(&self, identity: UserRef) -> AuthResult<User> {
        match identity {
            UserRef::Id(id) => self
                .store
                .find_by_id(id)
                .await?
                .ok_or(AuthError::UserNotFound),
            UserRef::NameOrEmail(handle) => {
                let handle = handle.trim().to_string();
                if handle.is_empty() {
                    return Err(AuthError::MissingField("username or email"));
                }
                if let Some(user) = self.store.find_by_username(&handle.to_lowercase()).await? {
                    return Ok(user);
                }
                self.store
                    .find_by_email(&handle)
                    .await?
                    .ok_or(AuthError::UserNotFound)
            }
        }
    }

    async fn resolve_by_handles(
        &self,
        username: &Option<String>,
        email: &Option<String>,
    ) -> AuthResult<User> {
        let username = username.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let email = email.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if username.is_none() && email.is_none() {
            return Err(AuthError::MissingField("username or email"));
        }

        if let Some(username) = username {
            if let Some(user) = self.store.find_by_username(&username.to_lowercase()).await? {
                return Ok(user);
            }
        }
        if let Some(email) = email {
            if let Some(user) = self.store.find_by_email(email).await? {
                return Ok(user);
            }
        }

        Err(AuthError::UserNotFound)
    }
}
