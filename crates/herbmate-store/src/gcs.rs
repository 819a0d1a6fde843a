//! Cloud Storage object store
//!
//! Downloads objects through the JSON API media endpoint:
//! `GET {endpoint}/storage/v1/b/{bucket}/o/{key}?alt=media`.

use async_trait::async_trait;
use herbmate_core::{ArtifactError, ArtifactResult, StoreConfig};
use reqwest::{Client, StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::traits::ObjectStore;

/// Object store backed by Google Cloud Storage
pub struct GcsStore {
    client: Client,
    /// Base URL of the storage API
    endpoint: String,
    /// Bearer token, if the bucket is not public
    access_token: Option<String>,
}

impl GcsStore {
    /// Create a new Cloud Storage client from configuration
    pub fn new(config: &StoreConfig) -> ArtifactResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("herbmate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ArtifactError::Transfer(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Build the media download URL for an object
    pub fn object_url(&self, bucket: &str, key: &str) -> ArtifactResult<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            ArtifactError::Transfer(format!("Invalid storage endpoint '{}': {}", self.endpoint, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ArtifactError::Transfer(format!(
                    "Storage endpoint cannot be a base URL: {}",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            // The key is a single segment, so '/' inside it is percent-encoded
            .extend(["storage", "v1", "b", bucket, "o", key]);
        url.query_pairs_mut().append_pair("alt", "media");

        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn fetch_to_file(&self, bucket: &str, key: &str, dest: &Path) -> ArtifactResult<u64> {
        let url = self.object_url(bucket, key)?;
        info!(bucket = bucket, key = key, "Downloading model artifact from Cloud Storage");

        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| ArtifactError::Transfer(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ArtifactError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ArtifactError::Transfer(format!(
                "HTTP {} while downloading {}/{}",
                status, bucket, key
            )));
        }

        let expected = response.content_length();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ArtifactError::Transfer(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = expected {
            if expected != written {
                return Err(ArtifactError::Transfer(format!(
                    "Truncated download of {}/{}: expected {} bytes, got {}",
                    bucket, key, expected, written
                )));
            }
        }

        debug!(bytes = written, dest = %dest.display(), "Wrote object to disk");
        Ok(written)
    }

    fn name(&self) -> &'static str {
        "gcs"
    }
}
