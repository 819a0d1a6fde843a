//! REST API handlers

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    response::Json,
    routing::{get, post},
    Router,
};
use herbmate_core::PredictionResult;
use herbmate_runtime::{InferencePipeline, ModelHandle, Upload};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: InferencePipeline,
}

/// Create the API router
pub fn create_router(pipeline: InferencePipeline, max_upload_bytes: usize) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness message
async fn home() -> &'static str {
    "Welcome to the HerbMate model API!"
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
}

/// Report service and model state
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model_error = match state.pipeline.model() {
        ModelHandle::Ready(_) => None,
        ModelHandle::Unavailable { reason } => Some(reason.clone()),
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: model_error.is_none(),
        model_error,
    })
}

/// Classify an uploaded image
async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let request_id = Uuid::new_v4();

    // Reject before touching the body when there is no model
    state.pipeline.ensure_ready()?;

    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await?,
        Err(rejection) => {
            warn!(request_id = %request_id, error = %rejection, "Request is not multipart");
            None
        }
    };

    let result = state.pipeline.infer(upload).await?;

    info!(
        request_id = %request_id,
        predicted_class = result.predicted_class,
        "Prediction served"
    );

    Ok(Json(result))
}

/// Take the first `file` part that carries a filename.
///
/// A `file` part without a filename is a plain form value, not an upload.
async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok(Some(Upload {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}
