use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use crate::server::app::AppState;

/// Arm cancellation for the running Job. Idempotent; succeeds with no Job running.
pub async fn cancel_handler(Extension(state): Extension<AppState>) -> Json<Value> {
    state.runner.request_cancel();
    tracing::info!(job_active = state.runner.is_busy(), "cancellation requested");
    Json(json!({ "status": "cancel requested" }))
}
