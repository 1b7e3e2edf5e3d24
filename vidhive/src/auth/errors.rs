//! Authentication error types.

use thiserror::Error;

use crate::media::MediaError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Credential check failed (wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Username or email already registered
    #[error("Username or email already registered")]
    IdentityTaken,

    /// Required field missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// New password matches the current one
    #[error("New password must differ from the current password")]
    PasswordReused,

    /// JWT encoding error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Token signing secrets misconfigured
    #[error("Token configuration invalid: {0}")]
    TokenConfig(&'static str),

    /// Token failed signature, expiry, or type checks
    #[error("Invalid or expired token")]
    InvalidToken,

    /// No refresh token presented
    #[error("No refresh token presented")]
    MissingRefreshToken,

    /// Presented refresh token was already redeemed or replaced
    #[error("Refresh token expired or superseded")]
    RefreshTokenSuperseded,

    /// Asset host rejected or failed an upload
    #[error("Media upload failed: {0}")]
    Upload(#[from] MediaError),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and JWT errors are sanitized, and every refresh-token
    /// failure collapses to one message so callers can't probe which
    /// part of the check failed.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) => "Internal server error".to_string(),
            AuthError::Jwt(_) | AuthError::TokenConfig(_) => "Authentication failed".to_string(),
            AuthError::InvalidToken
            | AuthError::MissingRefreshToken
            | AuthError::RefreshTokenSuperseded => "Invalid refresh token".to_string(),
            AuthError::Upload(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
