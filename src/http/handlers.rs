use super::state::AppState;
use crate::capture::CaptureStatus;
use crate::error::Error;
use crate::pipeline::PipelineState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /capture/start
/// Start recording (no-op while already recording)
pub async fn start_capture(State(state): State<AppState>) -> impl IntoResponse {
    if state.capture.is_recording() {
        return (
            StatusCode::OK,
            Json(CaptureResponse {
                status: "recording".to_string(),
                message: "Already recording".to_string(),
            }),
        )
            .into_response();
    }

    match state.capture.start().await {
        Ok(()) => {
            info!("Capture started via HTTP");
            (
                StatusCode::OK,
                Json(CaptureResponse {
                    status: "recording".to_string(),
                    message: format!(
                        "Recording for up to {:.1}s",
                        state.capture.config().max_duration.as_secs_f64()
                    ),
                }),
            )
                .into_response()
        }
        Err(e @ Error::DeviceUnavailable { .. }) => {
            error!("Failed to start capture: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start capture: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /capture/stop
/// Stop recording early; the recording goes to the pipeline
pub async fn stop_capture(State(state): State<AppState>) -> impl IntoResponse {
    let stopped = state.capture.stop().await;

    let (status, message) = if stopped {
        ("stopped", "Recording stopped")
    } else {
        ("idle", "Nothing was recording")
    };

    (
        StatusCode::OK,
        Json(CaptureResponse {
            status: status.to_string(),
            message: message.to_string(),
        }),
    )
}

/// GET /capture/status
pub async fn get_capture_status(State(state): State<AppState>) -> Json<CaptureStatus> {
    Json(state.capture.status())
}

/// GET /pipeline/state
pub async fn get_pipeline_state(State(state): State<AppState>) -> Json<PipelineState> {
    Json(state.pipeline.state())
}

/// POST /pipeline/reset
pub async fn reset_pipeline(State(state): State<AppState>) -> Json<PipelineState> {
    state.pipeline.reset();
    Json(state.pipeline.state())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
