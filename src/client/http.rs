// reqwest implementation of the dashboard API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::error::{FetchError, ScanError, START_FAILED_MESSAGE};
use super::{DashboardApi, PROCESSED_PATH, SCAN_START_PATH, SCAN_STATUS_PATH};
use crate::report::model::{FetchedReport, ScanStartResponse, ScanStatusResponse};

/// Thin reqwest wrapper pointed at one dashboard backend.
pub struct DashboardClient {
    client: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cisdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DashboardApi for DashboardClient {
    async fn fetch_processed(&self) -> Result<FetchedReport, FetchError> {
        let url = self.url(PROCESSED_PATH);
        debug!(url = %url, "Fetching processed report");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(FetchError::Network)?;
        let raw: Value =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        FetchedReport::from_value(raw).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn start_scan(&self) -> Result<(), ScanError> {
        let url = self.url(SCAN_START_PATH);
        debug!(url = %url, "Requesting scan start");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(ScanError::Network)?;

        let ok = response.status().is_success();
        let bytes = response.bytes().await.map_err(ScanError::Network)?;
        let body: ScanStartResponse =
            serde_json::from_slice(&bytes).map_err(|e| ScanError::Decode {
                endpoint: SCAN_START_PATH,
                reason: e.to_string(),
            })?;

        match (ok, body.error) {
            (_, Some(message)) => Err(ScanError::Rejected(message)),
            (false, None) => Err(ScanError::Rejected(START_FAILED_MESSAGE.to_string())),
            (true, None) => Ok(()),
        }
    }

    async fn scan_status(&self) -> Result<ScanStatusResponse, ScanError> {
        let url = self.url(SCAN_STATUS_PATH);
        debug!(url = %url, "Checking scan status");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ScanError::Network)?;

        let bytes = response.bytes().await.map_err(ScanError::Network)?;
        serde_json::from_slice(&bytes).map_err(|e| ScanError::Decode {
            endpoint: SCAN_STATUS_PATH,
            reason: e.to_string(),
        })
    }
}
