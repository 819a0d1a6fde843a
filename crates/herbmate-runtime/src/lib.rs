//! herbmate-runtime: Model runtime and inference pipeline
//!
//! This crate turns a local artifact into a shared model handle and serves
//! predictions from it:
//! - `Classifier` abstraction with an ONNX Runtime implementation
//! - One-shot model initialisation with an unavailable sentinel on failure
//! - Image decoding and normalisation into the fixed input tensor
//! - The per-request inference pipeline

pub mod error;
pub mod model;
pub mod onnx;
pub mod pipeline;
pub mod preprocess;
pub mod traits;

pub use error::{RuntimeError, RuntimeResult};
pub use model::{initialize, ModelHandle};
pub use onnx::OnnxClassifier;
pub use pipeline::{InferencePipeline, Upload};
pub use traits::Classifier;
