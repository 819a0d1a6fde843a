//! Directory-backed object store
//!
//! Mirrors a bucket layout on local disk as `<root>/<bucket>/<key>`. Useful for
//! air-gapped deployments and for exercising the resolver without a network.

use async_trait::async_trait;
use herbmate_core::{ArtifactError, ArtifactResult};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::traits::ObjectStore;

/// Object store reading from a local directory tree
pub struct FsStore {
    /// Directory containing one sub-directory per bucket
    root: PathBuf,
}

impl FsStore {
    /// Create a new directory-backed store
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the on-disk path for an object, or `None` if the name escapes the root
    pub fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn fetch_to_file(&self, bucket: &str, key: &str, dest: &Path) -> ArtifactResult<u64> {
        let source = self.object_path(bucket, key).ok_or_else(|| {
            ArtifactError::Transfer(format!("Unsafe object name: {}/{}", bucket, key))
        })?;

        if !tokio::fs::try_exists(&source).await? {
            return Err(ArtifactError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let copied = tokio::fs::copy(&source, dest).await?;
        debug!(source = %source.display(), bytes = copied, "Copied object from directory store");
        Ok(copied)
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}
