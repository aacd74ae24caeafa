use super::state::AppState;
use crate::error::CaptureError;
use crate::session::{CaptureState, SessionStats};
use crate::upload::VoiceUpload;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub session_id: Uuid,
    pub status: CaptureState,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: CaptureState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionStats>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    pub remediation: &'static str,
}

fn error_response(e: &CaptureError) -> Response {
    let status = match e {
        CaptureError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CaptureError::AlreadyRecording | CaptureError::NotRecording => StatusCode::CONFLICT,
        CaptureError::EmptyCapture | CaptureError::DecodeFailure(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CaptureError::SessionSealed | CaptureError::Encode(_) | CaptureError::Interrupted(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            kind: e.kind(),
            remediation: e.remediation(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /voice/record/start
/// Acquire the microphone and start a recording session
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    let mut controller = state.controller.lock().await;

    match controller.start_recording().await {
        Ok(session_id) => {
            info!("Recording started: {}", session_id);
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    session_id,
                    status: controller.state(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start recording: {}", e);
            error_response(&e)
        }
    }
}

/// POST /voice/record/stop
/// Stop recording and return the WAV as a `voice.wav` attachment
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    let result = {
        let mut controller = state.controller.lock().await;
        controller.stop_recording().await
    };

    match result {
        Ok(wav) => {
            let upload = VoiceUpload::new(wav);
            info!(
                "Recording stopped: {} ({} bytes)",
                upload.file_name(),
                upload.wav().len()
            );

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, upload.mime_type().to_string()),
                    (header::CONTENT_DISPOSITION, upload.content_disposition()),
                ],
                upload.into_bytes(),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            error_response(&e)
        }
    }
}

/// GET /voice/record/status
/// Get controller state and live session statistics
///
/// While a stop is finalizing it holds the controller, so the response
/// carries the state without session statistics.
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let current = *state.capture_state.borrow();

    let session = match state.controller.try_lock() {
        Ok(controller) => controller.stats().await,
        Err(_) => None,
    };

    (
        StatusCode::OK,
        Json(StatusResponse {
            state: current,
            session,
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
