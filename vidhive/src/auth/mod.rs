//! Authentication module providing registration, login, and the
//! access/refresh token session lifecycle.
//!
//! This module implements secure authentication with:
//! - Argon2id password hashing with server-side pepper
//! - Short-lived JWT access tokens and long-lived refresh tokens,
//!   signed with distinct secrets
//! - Single-use refresh tokens, rotated atomically on every redemption
//! - Sanitized user views that never expose credential fields
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vidhive::auth::{AuthManager, LoginRequest, TokenConfig, TokenIssuer};
//! use vidhive::db::MemoryUserRepository;
//! use vidhive::media::MemoryAssetStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let issuer = TokenIssuer::new(TokenConfig::new("access_secret", "refresh_secret"))?;
//!     let auth = AuthManager::new(
//!         Arc::new(MemoryUserRepository::new()),
//!         Arc::new(MemoryAssetStore::new()),
//!         issuer,
//!         "pepper".to_string(),
//!     );
//!
//!     let (user, tokens) = auth
//!         .login(LoginRequest {
//!             username: Some("alice".to_string()),
//!             email: None,
//!             password: "SecurePass123".to_string(),
//!         })
//!         .await?;
//!     println!("Logged in {} with token {}", user.username, tokens.access_token);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod tokens;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{
    LoginRequest, NewUser, PublicUser, RegisterRequest, TokenPair, User, UserId, UserRef,
};
pub use tokens::{Claims, TokenConfig, TokenIssuer};
