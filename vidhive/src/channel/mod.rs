//! Channel reporting module: subscriber aggregation, subscription
//! toggling, and watch history.
//!
//! Pure read-side reporting plus the subscription glue it depends on;
//! none of this participates in the session lifecycle.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ChannelError, ChannelResult};
pub use manager::ChannelManager;
pub use models::{ChannelProfile, WatchEntry};
