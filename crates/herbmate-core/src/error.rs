//! Error types for herbmate

use thiserror::Error;

/// General error type for herbmate plumbing (config, IO)
#[derive(Error, Debug)]
pub enum HerbmateError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for herbmate operations
pub type HerbmateResult<T> = Result<T, HerbmateError>;

impl From<toml::de::Error> for HerbmateError {
    fn from(err: toml::de::Error) -> Self {
        HerbmateError::Config(err.to_string())
    }
}

/// Failure to materialise the model artifact on local storage.
///
/// `NotFound` means the bucket/key pair is wrong and retrying will not help;
/// everything else is reported as `Transfer`.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The object store has no object under this key
    #[error("Model artifact '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    /// Network, permission, or local write failure
    #[error("Failed to transfer model artifact: {0}")]
    Transfer(String),
}

impl From<std::io::Error> for ArtifactError {
    fn from(err: std::io::Error) -> Self {
        ArtifactError::Transfer(err.to_string())
    }
}

/// Result type for artifact resolution
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Per-request prediction failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// Model could not be resolved or loaded at startup
    #[error("Model is not available for prediction")]
    ModelUnavailable,

    /// Request carried no `file` upload
    #[error("No file was uploaded")]
    NoFileProvided,

    /// Upload had an empty filename
    #[error("No file was selected")]
    EmptyFilename,

    /// Payload is not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Unexpected failure while transforming the image or running the model
    #[error("Error while processing prediction: {0}")]
    Inference(String),
}

impl PredictError {
    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::NoFileProvided | PredictError::EmptyFilename | PredictError::Decode(_)
        )
    }

    /// HTTP status code for this failure
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

/// Result type for prediction requests
pub type PredictResult<T> = Result<T, PredictError>;
