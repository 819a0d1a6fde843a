//! Model artifact resolution
//!
//! A cached file is trusted unconditionally. A missing one is fetched once into a
//! sibling `.part` file and renamed into place, so an interrupted fetch never
//! leaves a truncated artifact at the cache path.

use herbmate_core::{ArtifactConfig, ArtifactError, ArtifactResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::traits::ObjectStore;

/// A model binary identified by name, remote location and local cache path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    /// Logical model name
    pub name: String,
    /// Object store bucket
    pub bucket: String,
    /// Object key inside the bucket
    pub key: String,
    /// Local cache file
    pub local_path: PathBuf,
}

impl From<&ArtifactConfig> for ModelArtifact {
    fn from(config: &ArtifactConfig) -> Self {
        Self {
            name: config.name.clone(),
            bucket: config.bucket.clone(),
            key: config.key.clone(),
            local_path: config.local_path.clone(),
        }
    }
}

/// Resolves model artifacts to a local file
pub struct ArtifactResolver {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactResolver {
    /// Create a resolver on top of an object store
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Make sure the artifact exists locally and return its path
    pub async fn resolve(&self, artifact: &ModelArtifact) -> ArtifactResult<PathBuf> {
        let local_path = &artifact.local_path;

        if tokio::fs::try_exists(local_path).await? {
            info!(
                model = %artifact.name,
                path = %local_path.display(),
                "Model artifact already cached locally"
            );
            return Ok(local_path.clone());
        }

        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(local_path);
        info!(
            model = %artifact.name,
            store = self.store.name(),
            bucket = %artifact.bucket,
            key = %artifact.key,
            "Fetching model artifact"
        );

        let fetched = match self
            .store
            .fetch_to_file(&artifact.bucket, &artifact.key, &partial)
            .await
        {
            Ok(bytes) => tokio::fs::rename(&partial, local_path)
                .await
                .map(|_| bytes)
                .map_err(ArtifactError::from),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(bytes) => {
                info!(
                    model = %artifact.name,
                    path = %local_path.display(),
                    bytes = bytes,
                    "Model artifact downloaded"
                );
                Ok(local_path.clone())
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial download");
                    }
                }
                Err(e)
            }
        }
    }
}

/// `model.onnx` -> `model.onnx.part`, in the same directory
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".part");
    path.with_file_name(name)
}
