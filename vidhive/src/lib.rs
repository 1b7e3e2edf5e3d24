//! # VidHive
//!
//! Backend library for a social video platform: account registration,
//! credential verification, and the paired access/refresh token session
//! lifecycle that gates every other platform operation.
//!
//! ## Architecture
//!
//! The session lifecycle is a small state machine over a user's
//! authentication status:
//!
//! - **Anonymous**: no stored refresh token matches the caller
//! - **Authenticated**: the stored refresh token exists and matches the
//!   presented one
//! - **LoggedOut**: the stored refresh token has been cleared
//!
//! Login and refresh both overwrite the stored refresh token, so at most
//! one refresh token is valid per user at any time; refresh performs the
//! overwrite as a single conditional update, which makes every refresh
//! token single-use even under concurrent redemption attempts.
//!
//! ## Core Modules
//!
//! - [`auth`]: Session lifecycle, password hashing, token issuing
//! - [`db`]: Connection pooling and the user-record store boundary
//! - [`media`]: External asset host client for avatars and covers
//! - [`channel`]: Read-side reporting (subscribers, watch history)
//!
//! ## Example
//!
//! ```no_run
//! use vidhive::auth::{TokenConfig, TokenIssuer};
//!
//! let issuer = TokenIssuer::new(TokenConfig::new("access_secret", "refresh_secret"))
//!     .expect("distinct secrets");
//! let token = issuer.issue_access_token(1).expect("signing succeeds");
//! assert!(issuer.verify_access_token(&token).is_ok());
//! ```

/// Session lifecycle, password hashing, and token issuing.
pub mod auth;
pub use auth::{AuthManager, TokenConfig, TokenIssuer};

/// Channel reporting: subscriber aggregation and watch history.
pub mod channel;
pub use channel::ChannelManager;

/// Database pooling and the user-record store boundary.
pub mod db;
pub use db::{Database, DatabaseConfig, UserRepository};

/// External asset host client.
pub mod media;
pub use media::AssetStore;
