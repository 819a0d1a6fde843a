//! HTTP error responses

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use herbmate_core::PredictError;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by the prediction route
#[derive(Debug)]
pub enum ApiError {
    /// Pipeline failure
    Predict(PredictError),
    /// The multipart stream could not be read
    Upload(MultipartError),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Upload(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Predict(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if err.is_client_error() {
                    warn!(error = %err, "Rejected prediction request");
                } else {
                    error!(error = %err, "Prediction failed");
                }
                (status, err.to_string())
            }
            ApiError::Upload(err) => {
                warn!(error = %err, "Failed to read upload");
                (err.status(), err.body_text())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
