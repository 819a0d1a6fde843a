//! Per-request inference pipeline

use herbmate_core::{PredictError, PredictResult, PredictionResult};
use std::sync::Arc;
use tracing::{debug, error};

use crate::model::ModelHandle;
use crate::preprocess;
use crate::traits::Classifier;

/// A file taken from the request
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename declared by the client
    pub filename: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// Turns uploaded images into predictions using the shared model handle
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    model: ModelHandle,
}

impl InferencePipeline {
    /// Create a pipeline around a model handle
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// Get the model handle
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Check that the request can be served at all, before reading its body
    pub fn ensure_ready(&self) -> PredictResult<&Arc<dyn Classifier>> {
        self.model.classifier().ok_or(PredictError::ModelUnavailable)
    }

    /// Classify an uploaded image.
    ///
    /// Checks run in order: model availability, presence of a file, non-empty
    /// filename. Decoding and model invocation run on the blocking pool.
    pub async fn infer(&self, upload: Option<Upload>) -> PredictResult<PredictionResult> {
        let classifier = Arc::clone(self.ensure_ready()?);
        let upload = upload.ok_or(PredictError::NoFileProvided)?;
        if upload.filename.is_empty() {
            return Err(PredictError::EmptyFilename);
        }

        debug!(filename = %upload.filename, bytes = upload.bytes.len(), "Running inference");

        tokio::task::spawn_blocking(move || classify(classifier.as_ref(), &upload.bytes))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Inference task failed");
                Err(PredictError::Inference(e.to_string()))
            })
    }
}

/// Decode, normalise, invoke the model and summarise its output
pub fn classify(classifier: &dyn Classifier, bytes: &[u8]) -> PredictResult<PredictionResult> {
    let tensor = preprocess::preprocess(bytes)?;

    let scores = classifier
        .predict(&tensor)
        .map_err(|e| PredictError::Inference(e.to_string()))?;

    PredictionResult::from_scores(scores)
        .ok_or_else(|| PredictError::Inference("Model returned no scores".to_string()))
}
