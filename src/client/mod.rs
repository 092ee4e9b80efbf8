// Dashboard backend API — the report fetch and the scan job endpoints.
//
// `DashboardApi` is the seam the scan controller and the CLI talk through;
// `DashboardClient` is the reqwest implementation used against a live backend.

pub mod error;
pub mod http;

use async_trait::async_trait;

use crate::report::model::{FetchedReport, ScanStatusResponse};

pub use error::{FetchError, ScanError};
pub use http::DashboardClient;

/// Default backend base URL (the Flask/axum service's default port).
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

pub const PROCESSED_PATH: &str = "/api/processed";
pub const SCAN_START_PATH: &str = "/api/scan/start";
pub const SCAN_STATUS_PATH: &str = "/api/scan/status";

/// The three backend calls the dashboard makes. One attempt each, no retries.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// GET the processed report, keeping the payload as received.
    async fn fetch_processed(&self) -> Result<FetchedReport, FetchError>;

    /// POST a scan start request. `Ok` means the backend accepted it.
    async fn start_scan(&self) -> Result<(), ScanError>;

    /// GET the current job status.
    async fn scan_status(&self) -> Result<ScanStatusResponse, ScanError>;
}
