//! ONNX Runtime classifier

use herbmate_core::{ImageTensor, RuntimeConfig};
use ort::inputs;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};
use crate::traits::Classifier;

/// Image classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so concurrent requests are
/// serialised on the session mutex. Everything else about the handle is
/// immutable after load.
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    /// Deserialise an ONNX model from disk
    pub fn load(model_path: &Path, config: &RuntimeConfig) -> RuntimeResult<Self> {
        info!(path = %model_path.display(), "Loading ONNX model");

        if !model_path.exists() {
            return Err(RuntimeError::Load(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| RuntimeError::Load(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RuntimeError::Load(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(config.intra_threads)
            .map_err(|e| RuntimeError::Load(format!("Failed to set intra threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| RuntimeError::Load(e.to_string()))?;

        debug!(intra_threads = config.intra_threads, "ONNX session ready");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &ImageTensor) -> RuntimeResult<Vec<Vec<f32>>> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let tensor = TensorRef::from_array_view((shape, input.as_slice()))
            .map_err(|e| RuntimeError::Invoke(format!("Failed to create input tensor: {}", e)))?;

        let mut session = lock_session(&self.session);

        let outputs = session
            .run(inputs![tensor])
            .map_err(|e| RuntimeError::Invoke(format!("Inference failed: {}", e)))?;

        let (dims, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RuntimeError::Invoke(format!("Failed to extract scores: {}", e)))?;

        rows(dims, scores)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Lock the session, recovering from a panic in an earlier request.
///
/// The session holds no state across runs, so a poisoned lock is still usable.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Split a flat model output into one row per batch entry.
///
/// Rank-0/1 outputs are a single row; otherwise the leading dimension is the
/// batch and the remaining dimensions form each row.
fn rows(dims: &[i64], scores: &[f32]) -> RuntimeResult<Vec<Vec<f32>>> {
    if scores.is_empty() {
        return Err(RuntimeError::Invoke("Model returned no scores".to_string()));
    }
    if dims.len() < 2 {
        return Ok(vec![scores.to_vec()]);
    }

    let batch = usize::try_from(dims[0]).unwrap_or(0);
    if batch == 0 || scores.len() % batch != 0 {
        return Err(RuntimeError::Invoke(format!(
            "Unexpected output shape {:?} for {} values",
            dims,
            scores.len()
        )));
    }

    Ok(scores
        .chunks(scores.len() / batch)
        .map(<[f32]>::to_vec)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_single_batch() {
        let rows = rows(&[1, 3], &[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(rows, vec![vec![0.1, 0.7, 0.2]]);
    }

    #[test]
    fn test_rows_flat_output_is_one_row() {
        let rows = rows(&[3], &[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(rows, vec![vec![0.1, 0.7, 0.2]]);
        assert_eq!(herbmate_core::argmax(&rows[0]), Some(1));
    }

    #[test]
    fn test_rows_multi_batch() {
        let rows = rows(&[2, 2], &[0.9, 0.1, 0.3, 0.7]).unwrap();
        assert_eq!(rows, vec![vec![0.9, 0.1], vec![0.3, 0.7]]);
    }

    #[test]
    fn test_rows_rejects_empty_batch() {
        assert!(matches!(rows(&[0, 3], &[]), Err(RuntimeError::Invoke(_))));
        assert!(matches!(rows(&[0, 3], &[1.0]), Err(RuntimeError::Invoke(_))));
    }

    #[test]
    fn test_rows_rejects_mismatched_shape() {
        assert!(matches!(
            rows(&[2, 2], &[0.1, 0.2, 0.3]),
            Err(RuntimeError::Invoke(_))
        ));
    }

    #[test]
    fn test_poisoned_session_lock_recovers() {
        let session = std::sync::Arc::new(Mutex::new(7u32));
        let poisoner = std::sync::Arc::clone(&session);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("run panicked");
        })
        .join();

        assert!(session.is_poisoned());
        assert_eq!(*lock_session(&session), 7);
    }

    #[test]
    fn test_load_missing_file() {
        let err = OnnxClassifier::load(
            Path::new("/nonexistent/model.onnx"),
            &RuntimeConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RuntimeError::Load(_)));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"this is not a protobuf graph").unwrap();

        let err = OnnxClassifier::load(&path, &RuntimeConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::Load(_)));
    }
}
