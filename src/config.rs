use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::scan::controller::{ScanConfig, DEFAULT_POLL_INTERVAL, DEFAULT_RELOAD_DELAY};

/// Where the scanner writes its raw results inside the container.
pub const DEFAULT_RESULTS_PATH: &str = "/output/results.json";
pub const DEFAULT_JOB_NAME: &str = "cis-k8s-audit";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_JOB_IMAGE: &str = "mohanvamsi06/fyp:master_node";

/// Tetragon event export, one JSON event per line.
pub const DEFAULT_RUNTIME_LOGS_PATH: &str = "/output/runtime_alerts.json";

/// Binaries whose events are noise from the monitoring tooling itself.
pub const DEFAULT_EXCLUDED_BINARIES: &str =
    "kubectl,jq,grep,bash,sh,chmod,touch,echo,cat,head,tail,sed,awk,curl,wget";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// setting has a default, so a bare `cisdash show` works against a local
/// backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dashboard backend base URL (CISDASH_URL).
    pub base_url: String,
    pub poll_interval: Duration,
    pub reload_delay: Duration,
    /// Status checks before giving up. Unset means poll until the job settles.
    pub max_polls: Option<u32>,
    /// Raw scanner output read by the backend (RESULT_JSON_PATH).
    pub results_path: PathBuf,
    pub job_name: String,
    pub namespace: String,
    pub job_image: String,
    /// kubectl binary used to drive the scan Job.
    pub kubectl: String,
    /// Runtime alert log read by the backend (RUNTIME_LOGS_PATH).
    pub runtime_logs_path: PathBuf,
    /// Alerts from a binary whose path contains any of these are dropped.
    pub excluded_binaries: Vec<String>,
    /// Event types to keep. Empty keeps all.
    pub included_event_types: Vec<String>,
    /// Tracepoint subsystems to keep. Empty keeps all.
    pub included_subsystems: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            base_url: env::var("CISDASH_URL")
                .unwrap_or_else(|_| crate::client::DEFAULT_BASE_URL.to_string()),
            poll_interval: env_millis("CISDASH_POLL_INTERVAL_MS")?
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            reload_delay: env_millis("CISDASH_RELOAD_DELAY_MS")?.unwrap_or(DEFAULT_RELOAD_DELAY),
            max_polls: env_number("CISDASH_MAX_POLLS")?,
            results_path: env::var("RESULT_JSON_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_RESULTS_PATH)),
            job_name: env::var("CISDASH_JOB_NAME")
                .unwrap_or_else(|_| DEFAULT_JOB_NAME.to_string()),
            namespace: env::var("CISDASH_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            job_image: env::var("CISDASH_JOB_IMAGE")
                .unwrap_or_else(|_| DEFAULT_JOB_IMAGE.to_string()),
            kubectl: env::var("KUBECTL").unwrap_or_else(|_| "kubectl".to_string()),
            runtime_logs_path: env::var("RUNTIME_LOGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_RUNTIME_LOGS_PATH)),
            excluded_binaries: env_list("EXCLUDED_BINARIES")
                .unwrap_or_else(|| split_list(DEFAULT_EXCLUDED_BINARIES)),
            included_event_types: env_list("INCLUDED_EVENT_TYPES").unwrap_or_default(),
            included_subsystems: env_list("INCLUDED_SUBSYSTEMS").unwrap_or_default(),
        })
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            poll_interval: self.poll_interval,
            reload_delay: self.reload_delay,
            max_polls: self.max_polls,
        }
    }

    /// Reject settings that would make polling spin or never start.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("CISDASH_POLL_INTERVAL_MS must be greater than zero");
        }
        if self.max_polls == Some(0) {
            anyhow::bail!(
                "CISDASH_MAX_POLLS must be at least 1.\n\
                 Unset it to poll until the scan finishes."
            );
        }
        Ok(())
    }
}

fn env_number(key: &str) -> Result<Option<u32>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
        _ => Ok(None),
    }
}

fn env_millis(key: &str) -> Result<Option<Duration>> {
    Ok(env_number(key)?.map(|ms| Duration::from_millis(u64::from(ms))))
}

/// Comma-separated list from the environment. `None` when unset.
fn env_list(key: &str) -> Option<Vec<String>> {
    env::var(key).ok().map(|raw| split_list(&raw))
}

/// Blank entries are dropped: an empty name would match every binary.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
