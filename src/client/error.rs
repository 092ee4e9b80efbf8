// Errors surfaced by the dashboard's two network flows.
//
// Neither type is ever propagated past a command handler: the renderer and
// the scan controller turn them into text on their surface.

use thiserror::Error;

/// Failure to retrieve the processed report.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend answered outside the 2xx range.
    #[error("HTTP {status} {status_text}{}", body_suffix(.body))]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("network request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("invalid report payload: {0}")]
    Decode(String),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {body}")
    }
}

/// Failure to start a scan or to check on one.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The backend refused to start the scan. Carries its message verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("network request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("invalid response from {endpoint}: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },
}

/// Message shown when a non-ok start response carries no `error` field.
pub const START_FAILED_MESSAGE: &str = "Failed to start scan";
