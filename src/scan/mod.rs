// Scan trigger and status polling.
//
// The controller talks to the backend through `DashboardApi` and reports
// progress through a `ScanSurface`: a status line, the trigger control, and
// a reload request once a scan completes.

pub mod controller;
pub mod schedule;

use std::fmt;

pub use controller::{ScanConfig, ScanController};
pub use schedule::PollSchedule;

pub const MSG_STARTING: &str = "Starting scan…";
pub const MSG_RUNNING: &str = "Scan running…";
pub const MSG_COMPLETED: &str = "Scan completed. Reloading…";
pub const MSG_FAILED: &str = "Scan failed. Check logs.";
pub const MSG_STATUS_CHECK_FAILED: &str = "Status check failed";
pub const MSG_TIMED_OUT: &str = "Status check timed out";

/// The mount points the scan flow writes to.
pub trait ScanSurface {
    fn set_scan_status(&mut self, text: &str);
    fn set_trigger_enabled(&mut self, enabled: bool);
    /// Ask the host to re-run the fetch/render flow.
    fn request_reload(&mut self);
}

/// Where the scan flow stands.
///
/// `Idle -> Starting -> Polling -> {Completed, Failed, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Starting,
    Polling,
    Completed,
    Failed,
    Error,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Error)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
