use super::state::AppState;
use crate::detection::DetectionStatus;
use crate::recognition::RecognitionStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub detection: DetectionStatus,
    pub recognition: RecognitionStatus,
}

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        detection: state.detection.status(),
        recognition: state.recognition.status(),
    })
}

/// POST /recognition/start
pub async fn start_recognition(State(state): State<AppState>) -> impl IntoResponse {
    info!("Voice input resumed via API");
    state.recognition.start().await;
    (StatusCode::OK, Json(state.recognition.status()))
}

/// POST /recognition/stop
pub async fn stop_recognition(State(state): State<AppState>) -> impl IntoResponse {
    info!("Voice input paused via API");
    state.recognition.stop().await;
    (StatusCode::OK, Json(state.recognition.status()))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
