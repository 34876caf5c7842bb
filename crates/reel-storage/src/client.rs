//! S3-compatible client implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};
use reqwest::StatusCode;
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::store::{Access, BlobStore, UploadedBlob};

/// Configuration for the blob store client.
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2)
    pub region: String,
    /// Base URL objects are publicly served from, without trailing slash
    pub public_base_url: String,
    /// Send a `public-read` ACL for public uploads (stores without ACL support reject it)
    pub public_acl: bool,
}

impl BlobStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| StorageError::config_error(format!("{} not set", name)))
        };

        Ok(Self {
            endpoint_url: required("BLOB_ENDPOINT_URL")?,
            access_key_id: required("BLOB_ACCESS_KEY_ID")?,
            secret_access_key: required("BLOB_SECRET_ACCESS_KEY")?,
            bucket_name: required("BLOB_BUCKET_NAME")?,
            region: std::env::var("BLOB_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: required("BLOB_PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            public_acl: std::env::var("BLOB_PUBLIC_ACL")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

/// Blob store backed by an S3-compatible bucket.
#[derive(Clone)]
pub struct S3BlobClient {
    client: Client,
    http: reqwest::Client,
    bucket: String,
    public_base_url: String,
    public_acl: bool,
}

impl S3BlobClient {
    /// Create a new client from configuration.
    pub async fn new(config: BlobStoreConfig) -> StorageResult<Self> {
        Url::parse(&config.public_base_url).map_err(|e| {
            StorageError::config_error(format!("BLOB_PUBLIC_BASE_URL is not a URL: {}", e))
        })?;

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "reel",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;

        Ok(Self {
            client: Client::from_conf(sdk_config),
            http,
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            public_acl: config.public_acl,
        })
    }

    /// Public URL for a key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Delete an object by key.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobClient {
    async fn upload(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
        access: Access,
    ) -> StorageResult<UploadedBlob> {
        debug!("Uploading {} bytes to {}", data.len(), key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type);

        if access == Access::Public && self.public_acl {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let url = self.public_url(key);
        info!("Uploaded {} to {}", key, url);

        Ok(UploadedBlob {
            url,
            pathname: key.to_string(),
        })
    }

    async fn delete(&self, url: &str) -> bool {
        let Some(key) = key_from_url(&self.public_base_url, url) else {
            warn!(url, "Refusing to delete blob outside the public base URL");
            return false;
        };

        match self.delete_object(&key).await {
            Ok(()) => {
                info!(key = %key, "Deleted blob");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to delete blob");
                false
            }
        }
    }

    async fn download(&self, url: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(StorageError::download_failed(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Map a public object URL back to its bucket key.
///
/// Returns `None` unless `url` has the same origin as `public_base_url` and
/// its path lies strictly below the base path.
pub fn key_from_url(public_base_url: &str, url: &str) -> Option<String> {
    let base = Url::parse(public_base_url).ok()?;
    let target = Url::parse(url).ok()?;

    if base.scheme() != target.scheme()
        || base.host_str() != target.host_str()
        || base.port_or_known_default() != target.port_or_known_default()
    {
        return None;
    }

    let base_path = base.path().trim_end_matches('/');
    let rest = target.path().strip_prefix(base_path)?.strip_prefix('/')?;
    if rest.is_empty() {
        return None;
    }

    urlencoding::decode(rest).ok().map(|key| key.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(public_base_url: &str) -> BlobStoreConfig {
        BlobStoreConfig {
            endpoint_url: "http://127.0.0.1:9".to_string(),
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            bucket_name: "videos".to_string(),
            region: "auto".to_string(),
            public_base_url: public_base_url.to_string(),
            public_acl: false,
        }
    }

    #[test]
    fn test_key_from_url() {
        let base = "https://cdn.example.com";
        assert_eq!(
            key_from_url(base, "https://cdn.example.com/videos/a.mp4").as_deref(),
            Some("videos/a.mp4")
        );
        assert_eq!(
            key_from_url(base, "https://cdn.example.com/videos/my%20clip.mp4").as_deref(),
            Some("videos/my clip.mp4")
        );
        assert_eq!(key_from_url(base, "https://other.example.com/videos/a.mp4"), None);
        assert_eq!(key_from_url(base, "https://cdn.example.com/"), None);
        assert_eq!(key_from_url(base, "not a url"), None);
    }

    #[test]
    fn test_key_from_url_with_base_path() {
        let base = "https://cdn.example.com/bucket";
        assert_eq!(
            key_from_url(base, "https://cdn.example.com/bucket/thumbnails/1_x.jpg").as_deref(),
            Some("thumbnails/1_x.jpg")
        );
        assert_eq!(key_from_url(base, "https://cdn.example.com/bucketx/a.jpg"), None);
    }

    #[tokio::test]
    async fn test_download_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/a.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake video".to_vec()))
            .mount(&server)
            .await;

        let client = S3BlobClient::new(test_config(&server.uri())).await.unwrap();
        let bytes = client
            .download(&format!("{}/videos/a.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"fake video");
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = S3BlobClient::new(test_config(&server.uri())).await.unwrap();
        let err = client
            .download(&format!("{}/videos/missing.mp4", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_download_requires_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/partial.mp4"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(b"frag".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos/empty.mp4"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = S3BlobClient::new(test_config(&server.uri())).await.unwrap();
        for name in ["partial", "empty"] {
            let err = client
                .download(&format!("{}/videos/{}.mp4", server.uri(), name))
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::DownloadFailed(_)), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_delete_outside_base_is_refused() {
        let client = S3BlobClient::new(test_config("https://cdn.example.com"))
            .await
            .unwrap();
        assert!(!client.delete("https://elsewhere.example.com/a.mp4").await);
        assert_eq!(
            client.public_url("thumbnails/1_x.jpg"),
            "https://cdn.example.com/thumbnails/1_x.jpg"
        );
    }
}
