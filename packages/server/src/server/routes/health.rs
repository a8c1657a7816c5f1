use axum::{extract::Extension, Json};
use serde::Serialize;

use automation::CancelState;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    job_active: bool,
    cancel_state: CancelState,
}

/// Health check endpoint
///
/// Always 200 while the process is serving; reports whether a Job holds the
/// slot and whether cancellation is armed.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        job_active: state.runner.is_busy(),
        cancel_state: state.runner.cancel_state(),
    })
}
