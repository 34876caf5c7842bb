//! The blob store seam.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageResult;
use reel_models::VideoId;

/// Visibility of an uploaded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Private,
}

/// Location of an object after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    /// Public URL of the object
    pub url: String,
    /// Key inside the bucket
    pub pathname: String,
}

/// Object storage used for source videos and thumbnails.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`.
    async fn upload(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
        access: Access,
    ) -> StorageResult<UploadedBlob>;

    /// Delete the object behind a public URL.
    ///
    /// Returns `false` when the object could not be removed; never errors.
    async fn delete(&self, url: &str) -> bool;

    /// Fetch the full body of a URL.
    async fn download(&self, url: &str) -> StorageResult<Vec<u8>>;
}

/// Storage key for a freshly generated thumbnail.
pub fn thumbnail_key(video_id: VideoId) -> String {
    format!("thumbnails/{}_{}.jpg", video_id, Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_key() {
        let key = thumbnail_key(VideoId(7));
        assert!(key.starts_with("thumbnails/7_"));
        assert!(key.ends_with(".jpg"));
        assert_ne!(key, thumbnail_key(VideoId(7)));
    }
}
