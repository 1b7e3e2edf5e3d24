//! Channel reporting error types.

use thiserror::Error;

/// Channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No channel with this username
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Users cannot subscribe to themselves
    #[error("Cannot subscribe to your own channel")]
    SelfSubscription,
}

impl ChannelError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            ChannelError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;
