//! Classifier trait definitions

use herbmate_core::ImageTensor;

use crate::error::RuntimeResult;

/// A loaded model that maps an input batch to raw class scores.
///
/// Implementations are shared across request handlers and must be safe to call
/// from several threads at once.
pub trait Classifier: Send + Sync {
    /// Run the model, returning one score row per batch entry
    fn predict(&self, input: &ImageTensor) -> RuntimeResult<Vec<Vec<f32>>>;

    /// Get the classifier name
    fn name(&self) -> &str;
}
