use super::state::AppState;
use crate::coach::{BackendStatus, InterviewStarted, StartInterview};
use crate::error::CoachError;
use crate::recording::StopOutcome;
use crate::session::SessionSnapshot;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of every control action: `{"status": "success"|"error", "message": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub status: String,
    pub message: String,
    #[serde(flatten)]
    pub interview: InterviewStarted,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub status: String,
    pub message: String,
    pub question_index: usize,
}

fn status_for(err: &CoachError) -> StatusCode {
    match err {
        e if e.is_state_conflict() => StatusCode::CONFLICT,
        CoachError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        CoachError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for CoachError {
    fn into_response(self) -> Response {
        warn!("Request rejected: {}", self);
        (status_for(&self), Json(ActionResponse::error(self.to_string()))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/start
/// Replace the current interview with a new one
pub async fn start_interview(
    State(state): State<AppState>,
    body: Result<Json<StartInterview>, JsonRejection>,
) -> Result<Json<StartInterviewResponse>, CoachError> {
    let Json(req) = body.map_err(|e| CoachError::InvalidRequest(format!("Invalid request body: {}", e.body_text())))?;
    let interview = state.coach.start_interview(req).await?;

    info!("Interview {} started for {}", interview.session_id, interview.job);

    Ok(Json(StartInterviewResponse {
        status: "success".to_string(),
        message: "Interview started".to_string(),
        interview,
    }))
}

/// GET /api/state
/// Snapshot of the current interview
pub async fn get_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.coach.snapshot().await)
}

/// POST /api/record
/// Start recording the answer to the current question
pub async fn start_recording(State(state): State<AppState>) -> Result<Json<RecordResponse>, CoachError> {
    let started = state.coach.start_recording().await?;

    Ok(Json(RecordResponse {
        status: "success".to_string(),
        message: "Recording started - press stop when finished".to_string(),
        question_index: started.question_index,
    }))
}

/// POST /api/stop_recording
/// Ask the running recording to finish; poll /api/state for the result
pub async fn stop_recording(State(state): State<AppState>) -> Result<Json<ActionResponse>, CoachError> {
    let message = match state.coach.stop_recording().await? {
        StopOutcome::Requested => "Recording stop requested",
        StopOutcome::AlreadyFinishing => "Recording already finishing",
    };
    Ok(Json(ActionResponse::success(message)))
}

/// POST /api/reset_recording
/// Clear a stuck recording or processing state
pub async fn reset_recording(State(state): State<AppState>) -> Json<ActionResponse> {
    state.coach.reset_recording().await;
    Json(ActionResponse::success("Recording state has been reset"))
}

/// GET /api/voice_status
/// Backends currently in use
pub async fn voice_status(State(state): State<AppState>) -> Json<BackendStatus> {
    Json(state.coach.backend_status())
}

/// GET /api/check_voice
/// Retry the primary voice after a failure and report the backends in use
pub async fn check_voice(State(state): State<AppState>) -> Json<BackendStatus> {
    Json(state.coach.recheck_voice())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
