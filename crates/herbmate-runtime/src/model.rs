//! Process-wide model handle
//!
//! The handle is created once at startup and injected into the request layer.
//! Resolution or load failures produce the `Unavailable` sentinel instead of
//! aborting the process.

use herbmate_store::{ArtifactResolver, ModelArtifact};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::RuntimeResult;
use crate::traits::Classifier;

/// Loaded model, or the reason it could not be loaded
#[derive(Clone)]
pub enum ModelHandle {
    /// Model is ready to serve predictions
    Ready(Arc<dyn Classifier>),
    /// Startup failed; every prediction is rejected
    Unavailable { reason: String },
}

impl ModelHandle {
    /// Wrap a loaded classifier
    pub fn ready<C: Classifier + 'static>(classifier: C) -> Self {
        ModelHandle::Ready(Arc::new(classifier))
    }

    /// Build the unavailable sentinel
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable {
            reason: reason.into(),
        }
    }

    /// Check if a model is loaded
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }

    /// Get the classifier if one is loaded
    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        match self {
            ModelHandle::Ready(classifier) => Some(classifier),
            ModelHandle::Unavailable { .. } => None,
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelHandle::Ready(classifier) => {
                f.debug_tuple("Ready").field(&classifier.name()).finish()
            }
            ModelHandle::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Resolve the artifact and load it exactly once.
///
/// Never fails: any error is logged and turned into `ModelHandle::Unavailable`.
pub async fn initialize<L>(
    resolver: &ArtifactResolver,
    artifact: &ModelArtifact,
    load: L,
) -> ModelHandle
where
    L: FnOnce(PathBuf) -> RuntimeResult<Arc<dyn Classifier>> + Send + 'static,
{
    let path = match resolver.resolve(artifact).await {
        Ok(path) => path,
        Err(e) => {
            error!(model = %artifact.name, error = %e, "Model artifact could not be resolved");
            return ModelHandle::unavailable(e.to_string());
        }
    };

    match tokio::task::spawn_blocking(move || load(path)).await {
        Ok(Ok(classifier)) => {
            info!(model = %artifact.name, runtime = classifier.name(), "Model loaded into memory");
            ModelHandle::Ready(classifier)
        }
        Ok(Err(e)) => {
            error!(model = %artifact.name, error = %e, "Model failed to load");
            warn!("Serving without a model; predictions will be rejected");
            ModelHandle::unavailable(e.to_string())
        }
        Err(e) => {
            error!(model = %artifact.name, error = %e, "Model loader panicked");
            ModelHandle::unavailable(format!("Model loader panicked: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use async_trait::async_trait;
    use herbmate_core::{ArtifactError, ArtifactResult, ImageTensor};
    use herbmate_store::ObjectStore;
    use std::path::Path;

    struct Fixed;

    impl Classifier for Fixed {
        fn predict(&self, _: &ImageTensor) -> RuntimeResult<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct MissingStore;

    #[async_trait]
    impl ObjectStore for MissingStore {
        async fn fetch_to_file(&self, bucket: &str, key: &str, _: &Path) -> ArtifactResult<u64> {
            Err(ArtifactError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "missing"
        }
    }

    fn artifact(local_path: PathBuf) -> ModelArtifact {
        ModelArtifact {
            name: "classifier".to_string(),
            bucket: "herbmate-models".to_string(),
            key: "Models/model.onnx".to_string(),
            local_path,
        }
    }

    #[tokio::test]
    async fn test_initialize_ready() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("model.onnx");
        std::fs::write(&local, b"cached").unwrap();

        let resolver = ArtifactResolver::new(Arc::new(MissingStore));
        let handle = initialize(&resolver, &artifact(local.clone()), move |path| {
            assert_eq!(path, local);
            Ok(Arc::new(Fixed) as Arc<dyn Classifier>)
        })
        .await;

        assert!(handle.is_ready());
        assert_eq!(handle.classifier().unwrap().name(), "fixed");
    }

    #[tokio::test]
    async fn test_initialize_resolution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ArtifactResolver::new(Arc::new(MissingStore));

        let handle = initialize(&resolver, &artifact(dir.path().join("model.onnx")), |_| {
            Ok(Arc::new(Fixed) as Arc<dyn Classifier>)
        })
        .await;

        assert!(!handle.is_ready());
        match handle {
            ModelHandle::Unavailable { reason } => assert!(reason.contains("not found")),
            ModelHandle::Ready(_) => panic!("expected unavailable"),
        }
    }

    #[tokio::test]
    async fn test_initialize_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("model.onnx");
        std::fs::write(&local, b"corrupt").unwrap();

        let resolver = ArtifactResolver::new(Arc::new(MissingStore));
        let handle = initialize(&resolver, &artifact(local), |_| {
            Err(RuntimeError::Load("bad graph".to_string()))
        })
        .await;

        assert!(handle.classifier().is_none());
    }

    #[tokio::test]
    async fn test_initialize_loader_panic() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("model.onnx");
        std::fs::write(&local, b"cached").unwrap();

        let resolver = ArtifactResolver::new(Arc::new(MissingStore));
        let handle = initialize(&resolver, &artifact(local), |_| panic!("loader exploded")).await;

        assert!(!handle.is_ready());
    }
}
