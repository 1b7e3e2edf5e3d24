//! Media storage module for avatar and cover image assets.
//!
//! Binary media lives on an external asset host; this module only deals
//! in uploads and the `(url, asset_id)` pairs the host hands back. The
//! [`AssetStore`] trait is the boundary: [`HttpAssetStore`] talks to the
//! real host, [`MemoryAssetStore`] backs tests and local development.

pub mod errors;
pub mod store;

pub use errors::{MediaError, MediaResult};
pub use store::{AssetStore, HttpAssetStore, MediaAsset, MemoryAssetStore, Upload, asset_id_from_url};
