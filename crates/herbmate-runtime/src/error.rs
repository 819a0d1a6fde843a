//! Error types for the model runtime

use thiserror::Error;

/// Failures raised by the model runtime itself
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The artifact could not be deserialised into a session
    #[error("Failed to load model: {0}")]
    Load(String),

    /// The model failed while computing a prediction
    #[error("Model invocation failed: {0}")]
    Invoke(String),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
