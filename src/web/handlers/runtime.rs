// GET /api/runtime/alerts: filtered runtime alerts, newest first.
// GET /api/runtime/stats: the same alerts summarized.
//
// A missing log file is not a failure: both answer 200 with an `error` note.
// Any other read error is a 500.

use std::io::ErrorKind;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::web::runtime::{alert_stats, most_recent, parse_alerts, AlertFilter, AlertStats};
use crate::web::{api_error, AppState};

pub const NO_RUNTIME_LOGS: &str = "No runtime logs found";

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    stats: AlertStats,
    timestamp: f64,
}

/// `Ok(None)` when there is no log yet.
async fn load_alerts(state: &AppState) -> std::io::Result<Option<Vec<Value>>> {
    let text = match tokio::fs::read_to_string(&state.config.runtime_logs_path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(Some(parse_alerts(
        &text,
        &AlertFilter::from_config(&state.config),
    )))
}

/// Seconds since the epoch.
fn timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

pub async fn get_alerts(State(state): State<AppState>) -> Response {
    match load_alerts(&state).await {
        Ok(Some(alerts)) => {
            let alerts = most_recent(alerts);
            let total = alerts.len();
            Json(json!({ "alerts": alerts, "total": total, "timestamp": timestamp() }))
                .into_response()
        }
        Ok(None) => {
            Json(json!({ "alerts": [], "total": 0, "error": NO_RUNTIME_LOGS })).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not read runtime alerts");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "alerts": [], "total": 0 })),
            )
                .into_response()
        }
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Response {
    match load_alerts(&state).await {
        Ok(Some(alerts)) => Json(StatsResponse {
            stats: alert_stats(&alerts),
            timestamp: timestamp(),
        })
        .into_response(),
        Ok(None) => Json(json!({ "error": NO_RUNTIME_LOGS })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read runtime alerts");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
