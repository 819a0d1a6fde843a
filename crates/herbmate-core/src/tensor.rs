//! Model input and output types

use serde::{Deserialize, Serialize};

/// Side length of the square model input
pub const INPUT_SIZE: usize = 224;
/// Colour channels of the model input
pub const INPUT_CHANNELS: usize = 3;
/// Batch size used for every request
pub const BATCH_SIZE: usize = 1;

/// A single-image batch in NHWC layout with values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
}

impl ImageTensor {
    /// Shape of every input tensor
    pub const SHAPE: [usize; 4] = [BATCH_SIZE, INPUT_SIZE, INPUT_SIZE, INPUT_CHANNELS];

    /// Number of elements in an input tensor
    pub const LEN: usize = BATCH_SIZE * INPUT_SIZE * INPUT_SIZE * INPUT_CHANNELS;

    /// Build a tensor from interleaved RGB bytes of a 224x224 image,
    /// mapping each channel from `0..=255` to `[0, 1]`.
    ///
    /// Returns `None` when the buffer does not hold exactly one input image.
    pub fn from_rgb_bytes(pixels: &[u8]) -> Option<Self> {
        if pixels.len() != Self::LEN {
            return None;
        }
        let data = pixels.iter().map(|&v| f32::from(v) / 255.0).collect();
        Some(Self { data })
    }

    /// Tensor shape, including the leading batch dimension
    pub fn shape(&self) -> [usize; 4] {
        Self::SHAPE
    }

    /// Flattened values in row-major order
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Index of the highest score in the first batch row
    pub predicted_class: usize,
    /// Raw model output, one row per batch entry
    pub predictions: Vec<Vec<f32>>,
}

impl PredictionResult {
    /// Summarise raw model output.
    ///
    /// Returns `None` if there is no first row or it is empty.
    pub fn from_scores(predictions: Vec<Vec<f32>>) -> Option<Self> {
        let predicted_class = argmax(predictions.first()?)?;
        Some(Self {
            predicted_class,
            predictions,
        })
    }
}

/// Index of the maximum value; ties go to the lowest index and NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        let current = values[best];
        if v > current || (current.is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    (!values.is_empty()).then_some(best)
}
