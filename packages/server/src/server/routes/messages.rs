use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::{Deserialize, Serialize};

use automation::{JobStatus, MessageBatch};

use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Body of `POST /api/send-messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessagesRequest {
    pub message: Option<String>,
    pub numbers: Option<Vec<String>>,
    /// Delay between recipients in milliseconds.
    pub interval: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SendMessagesResponse {
    /// `processed` or `cancelled`.
    pub status: &'static str,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run a messaging Job and summarize the outcomes.
pub async fn send_messages_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<SendMessagesRequest>, JsonRejection>,
) -> Result<Json<SendMessagesResponse>, ApiError> {
    let Json(request) = payload?;
    let batch = MessageBatch::new(request.message, request.numbers, request.interval)?;

    let job = state.runner.begin()?;
    let pipeline = state.deps.messaging_pipeline();
    let report = tokio::spawn(async move { pipeline.run(&job, &batch).await })
        .await
        .map_err(|e| ApiError::Internal(format!("messaging job aborted: {}", e)))??;

    Ok(Json(SendMessagesResponse {
        status: match report.status {
            JobStatus::Completed => "processed",
            JobStatus::Cancelled => "cancelled",
        },
        sent: report.counts.succeeded,
        skipped: report.counts.skipped,
        failed: report.counts.failed,
    }))
}
