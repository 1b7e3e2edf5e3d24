//! Media storage error types.

use thiserror::Error;

/// Media storage errors
#[derive(Debug, Error)]
pub enum MediaError {
    /// Transport-level failure talking to the asset host
    #[error("Asset host request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Asset host answered with a non-success status
    #[error("Asset host returned status {0}")]
    HostStatus(u16),

    /// Upload completed but no usable URL came back
    #[error("Asset host did not return a usable URL")]
    UploadRejected,

    /// Asset host response could not be decoded
    #[error("Unexpected asset host response: {0}")]
    InvalidResponse(String),
}

impl MediaError {
    /// Get a client-safe error message that doesn't leak host details
    pub fn client_message(&self) -> String {
        "Media upload failed".to_string()
    }
}

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;
