//! Configuration types for herbmate

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding `artifact.bucket`
pub const ENV_BUCKET: &str = "HERBMATE_BUCKET";
/// Environment variable overriding `artifact.key`
pub const ENV_MODEL_KEY: &str = "HERBMATE_MODEL_KEY";
/// Environment variable overriding `artifact.local_path`
pub const ENV_MODEL_PATH: &str = "HERBMATE_MODEL_PATH";
/// Environment variable supplying the object store bearer token
pub const ENV_GCS_TOKEN: &str = "HERBMATE_GCS_TOKEN";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HerbmateConfig {
    /// API server configuration
    pub api: ApiConfig,
    /// Model artifact location
    pub artifact: ArtifactConfig,
    /// Object store configuration
    pub store: StoreConfig,
    /// Model runtime configuration
    pub runtime: RuntimeConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl HerbmateConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::HerbmateResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.artifact.bucket = bucket;
        }
        if let Some(key) = lookup(ENV_MODEL_KEY) {
            self.artifact.key = key;
        }
        if let Some(path) = lookup(ENV_MODEL_PATH) {
            self.artifact.local_path = PathBuf::from(path);
        }
        if let Some(token) = lookup(ENV_GCS_TOKEN).filter(|t| !t.is_empty()) {
            self.store.access_token = Some(token);
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the HTTP server
    pub address: String,
    /// Port for the HTTP server
    pub port: u16,
    /// Largest accepted request body for `/predict`
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

/// Where the model artifact lives remotely and where it is cached locally
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Logical model name used in logs
    pub name: String,
    /// Object store bucket
    pub bucket: String,
    /// Object key inside the bucket
    pub key: String,
    /// Local cache file
    pub local_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            name: "herbmate-classifier".to_string(),
            bucket: "herbmate-models".to_string(),
            key: "Models/model.onnx".to_string(),
            local_path: PathBuf::from("./model.onnx"),
        }
    }
}

/// Object store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Google Cloud Storage JSON API
    Gcs,
    /// Local directory tree laid out as `<root>/<bucket>/<key>`
    Fs,
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend type
    pub backend: StoreBackend,
    /// Base URL of the storage API
    pub endpoint: String,
    /// Root directory for the `fs` backend
    pub root: PathBuf,
    /// Bearer token for the storage API
    pub access_token: Option<String>,
    /// Whole-request timeout for artifact downloads, in seconds
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Gcs,
            endpoint: "https://storage.googleapis.com".to_string(),
            root: PathBuf::from("./buckets"),
            access_token: None,
            timeout_secs: 300,
        }
    }
}

/// Model runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Threads used inside a single operator
    pub intra_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { intra_threads: 4 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
