//! herbmate-store: Model artifact storage
//!
//! This crate makes sure the model binary is present on local disk:
//! - Object store abstraction with a Cloud Storage and a directory backend
//! - Artifact resolution that prefers the local cache over a remote fetch

pub mod fs;
pub mod gcs;
pub mod resolver;
pub mod traits;

pub use fs::FsStore;
pub use gcs::GcsStore;
pub use resolver::{ArtifactResolver, ModelArtifact};
pub use traits::ObjectStore;

use herbmate_core::{ArtifactResult, StoreBackend, StoreConfig};
use std::sync::Arc;

/// Build the object store selected by the configuration
pub fn store_from_config(config: &StoreConfig) -> ArtifactResult<Arc<dyn ObjectStore>> {
    Ok(match config.backend {
        StoreBackend::Gcs => Arc::new(GcsStore::new(config)?),
        StoreBackend::Fs => Arc::new(FsStore::new(config.root.clone())),
    })
}
