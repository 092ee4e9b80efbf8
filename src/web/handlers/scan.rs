// POST /api/scan/start — (re)launch the audit Job.
//
// Returns {"status": "started"} on success, 500 {"error": ...} when the old
// results can't be removed or kubectl rejects the manifest.
//
// GET /api/scan/status — {"status": "running" | "completed" | "failed" |
// "not_found" | "error"}. Always 200; the status field carries the outcome.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::{api_error, AppState};

pub async fn start_scan(State(state): State<AppState>) -> impl IntoResponse {
    match state.jobs.start().await {
        Ok(()) => Json(serde_json::json!({ "status": "started" })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start scan job");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

pub async fn scan_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.jobs.status().await)
}
