// GET /api/processed — the report the dashboard renders.
// GET /api/data — the raw findings it is built from.
// GET /result.json — the results file itself, byte for byte.
//
// All re-read the results file on every request; the scan job replaces it
// underneath us.

use std::io::ErrorKind;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::report::build::{build_report, load_findings};
use crate::web::{api_error, AppState};

pub async fn get_processed(State(state): State<AppState>) -> impl IntoResponse {
    let path = &state.config.results_path;
    match load_findings(path).await {
        Ok(findings) => {
            let report = build_report(&findings, &path.display().to_string());
            Json(report).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not load scan results");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}"))
        }
    }
}

pub async fn get_raw(State(state): State<AppState>) -> impl IntoResponse {
    match load_findings(&state.config.results_path).await {
        Ok(findings) => Json(findings).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}")),
    }
}

pub async fn get_results_file(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.config.results_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not read results file");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
