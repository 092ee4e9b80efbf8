// cisdash: dashboard for CIS Kubernetes compliance scans
//
// This is the library root. `report` is the data model and processing,
// `client` talks to the backend, `render` draws the report, `scan` drives
// the scan job, and `web` (feature-gated) is the backend itself.

pub mod client;
pub mod config;
pub mod render;
pub mod report;
pub mod scan;

#[cfg(feature = "web")]
pub mod web;
