// Web server — Axum backend the dashboard client talks to.
//
// Serves the processed report built from the scanner's raw results file,
// drives the audit Job, and exposes the runtime (Tetragon) alert log. No auth
// and no storage: every request re-reads the files it serves.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::{PROCESSED_PATH, SCAN_START_PATH, SCAN_STATUS_PATH};
use crate::config::Config;

pub mod handlers;
pub mod runtime;
pub mod scan_job;

use scan_job::{KubectlJobs, ScanJobs};

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jobs: Arc<dyn ScanJobs>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config, port: u16, bind: &str) -> Result<()> {
    let jobs = Arc::new(KubectlJobs::from_config(&config));
    let state = AppState {
        config: Arc::new(config),
        jobs,
    };

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("cisdash backend listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(PROCESSED_PATH, get(handlers::processed::get_processed))
        .route("/api/data", get(handlers::processed::get_raw))
        .route("/result.json", get(handlers::processed::get_results_file))
        .route(SCAN_START_PATH, post(handlers::scan::start_scan))
        .route(SCAN_STATUS_PATH, get(handlers::scan::scan_status))
        .route("/api/runtime/alerts", get(handlers::runtime::get_alerts))
        .route("/api/runtime/stats", get(handlers::runtime::get_stats))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
