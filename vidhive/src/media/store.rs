//! Asset store trait and implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{MediaError, MediaResult};

/// File payload received from a client, ready for upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stored asset reference returned by the asset host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Public URL for the asset
    pub url: String,
    /// Host-side identifier used for deletion
    pub asset_id: String,
}

/// Trait for asset host operations
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload a file, returning its public URL and deletable identifier
    async fn upload(&self, upload: Upload) -> MediaResult<MediaAsset>;

    /// Delete a previously uploaded asset
    async fn delete(&self, asset_id: &str) -> MediaResult<()>;
}

/// Extract the asset identifier from a public asset URL.
///
/// The host encodes the asset id as the final path segment, before any
/// file extension. Used when replacing an avatar or cover image, where
/// only the stored URL of the old asset is known.
pub fn asset_id_from_url(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let id = last.split('.').next().unwrap_or(last);
    if id.is_empty() { None } else { Some(id.to_string()) }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
    asset_id: Option<String>,
}

/// HTTP implementation of `AssetStore` against the external asset host
#[derive(Clone)]
pub struct HttpAssetStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpAssetStore {
    /// Create a new asset host client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Asset host base URL, without trailing slash
    /// * `api_key` - Bearer credential for the asset host
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, upload: Upload) -> MediaResult<MediaAsset> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/assets", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::HostStatus(response.status().as_u16()));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        match (body.url, body.asset_id) {
            (Some(url), Some(asset_id)) if !url.is_empty() => Ok(MediaAsset { url, asset_id }),
            _ => Err(MediaError::UploadRejected),
        }
    }

    async fn delete(&self, asset_id: &str) -> MediaResult<()> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, asset_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        // A missing asset is already deleted as far as we care.
        if response.status().is_success() || response.status().as_u16() == 404 {
            Ok(())
        } else {
            Err(MediaError::HostStatus(response.status().as_u16()))
        }
    }
}

/// In-memory implementation for tests and local development
#[derive(Default)]
pub struct MemoryAssetStore {
    assets: Mutex<HashMap<String, String>>,
    rejecting: bool,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose uploads always fail, for exercising upload-failure
    /// paths.
    pub fn rejecting() -> Self {
        Self {
            assets: Mutex::new(HashMap::new()),
            rejecting: true,
        }
    }

    /// Number of assets currently held
    pub fn asset_count(&self) -> usize {
        self.assets.lock().unwrap().len()
    }

    /// Whether an asset id is currently held
    pub fn contains(&self, asset_id: &str) -> bool {
        self.assets.lock().unwrap().contains_key(asset_id)
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload(&self, upload: Upload) -> MediaResult<MediaAsset> {
        if self.rejecting {
            return Err(MediaError::UploadRejected);
        }

        let asset_id = Uuid::new_v4().to_string();
        let url = format!("memory://assets/{}", asset_id);
        self.assets
            .lock()
            .unwrap()
            .insert(asset_id.clone(), upload.filename);

        Ok(MediaAsset { url, asset_id })
    }

    async fn delete(&self, asset_id: &str) -> MediaResult<()> {
        self.assets.lock().unwrap().remove(asset_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8; 16],
        }
    }

    #[tokio::test]
    async fn memory_store_upload_and_delete() {
        let store = MemoryAssetStore::new();

        let asset = store.upload(upload("avatar.png")).await.unwrap();
        assert!(asset.url.contains(&asset.asset_id));
        assert!(store.contains(&asset.asset_id));

        store.delete(&asset.asset_id).await.unwrap();
        assert!(!store.contains(&asset.asset_id));
    }

    #[tokio::test]
    async fn rejecting_store_fails_uploads() {
        let store = MemoryAssetStore::rejecting();
        let err = store.upload(upload("avatar.png")).await.unwrap_err();
        assert!(matches!(err, MediaError::UploadRejected));
    }

    #[test]
    fn asset_id_extraction() {
        assert_eq!(
            asset_id_from_url("https://cdn.example.com/assets/abc123.png"),
            Some("abc123".to_string())
        );
        assert_eq!(
            asset_id_from_url("memory://assets/xyz"),
            Some("xyz".to_string())
        );
        assert_eq!(asset_id_from_url(""), None);
    }
}
