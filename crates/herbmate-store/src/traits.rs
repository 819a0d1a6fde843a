//! Object store trait definitions

use async_trait::async_trait;
use herbmate_core::ArtifactResult;
use std::path::Path;

/// Remote storage holding model artifacts
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stream the object at `bucket`/`key` into `dest`, returning the byte count.
    ///
    /// Must return `ArtifactError::NotFound` when the object does not exist and
    /// `ArtifactError::Transfer` for every other failure.
    async fn fetch_to_file(&self, bucket: &str, key: &str, dest: &Path) -> ArtifactResult<u64>;

    /// Get the store name
    fn name(&self) -> &'static str;
}
