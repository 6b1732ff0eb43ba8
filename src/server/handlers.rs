//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use super::shutdown::Shutdown;
use crate::engine::Controller;

/// Shared application state
pub struct AppState {
    pub controller: Arc<Controller>,
    pub api_key: String,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(
        controller: Arc<Controller>,
        api_key: impl Into<String>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            controller,
            api_key: api_key.into(),
            shutdown,
        }
    }
}

/// Service version
pub async fn version() -> impl IntoResponse {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Current lifecycle state
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    tracing::debug!("Handling status request");
    let snapshot = state.controller.status().await?;
    Ok(Json(StatusResponse {
        model_state: snapshot.state.to_string(),
        job: snapshot.job.map(|job| JobStatus {
            id: job.id,
            path: job.input_path.display().to_string(),
            started_at: job.started_at,
        }),
    }))
}

/// Load the engine
pub async fn load_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusMessage>, ApiError> {
    tracing::info!("Handling load model request");
    let outcome = state.controller.load().await?;
    Ok(Json(StatusMessage::new(outcome.message())))
}

/// Release the engine
pub async fn unload_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusMessage>, ApiError> {
    tracing::info!("Handling unload model request");
    let outcome = state.controller.unload().await?;
    Ok(Json(StatusMessage::new(outcome.message())))
}

/// Start a background transcription
pub async fn start_transcribe(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranscribeRequest>, JsonRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    tracing::info!("Handling start transcribe request");
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let path = request.path.unwrap_or_default();

    let job_id = state.controller.start_job(path).await.map_err(|e| {
        tracing::warn!("Rejected transcription request: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(TranscribeResponse {
        status: "transcription started".to_string(),
        job_id,
    }))
}

/// Acknowledge, then shut the server down after the grace period
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<StatusMessage> {
    tracing::info!("Handling stop request");
    state.shutdown.request();
    Json(StatusMessage::new("shutting down"))
}

// Request/Response types

#[derive(Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub model_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobStatus>,
}

#[derive(Serialize, Deserialize)]
pub struct JobStatus {
    pub id: Uuid,
    pub path: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
}

impl StatusMessage {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct TranscribeRequest {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub status: String,
    pub job_id: Uuid,
}
