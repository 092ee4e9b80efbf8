// In-memory surface — keeps the latest value of every mount point.
//
// Backs `cisdash show --json` and lets the renderer and the scan controller
// be exercised without a terminal.

use serde::Serialize;

use super::{PerFileTable, RenderSurface, TopFailedList};
use crate::report::model::StatusBucket;
use crate::scan::ScanSurface;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySurface {
    pub total_checks: Option<String>,
    pub count_pass: Option<String>,
    pub count_fail: Option<String>,
    pub count_warn: Option<String>,
    pub status_summary: Option<String>,
    pub per_file: Option<PerFileTable>,
    pub top_failed: Option<TopFailedList>,
    #[serde(skip)]
    pub raw_json: Option<String>,
    pub scan_status: Option<String>,
    /// `None` until the controller first touches the trigger.
    pub trigger_enabled: Option<bool>,
    /// Every scan status message in order, for asserting on a whole run.
    #[serde(skip)]
    pub scan_history: Vec<String>,
    #[serde(skip)]
    pub reloads: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSurface for MemorySurface {
    fn set_total_checks(&mut self, text: &str) {
        self.total_checks = Some(text.to_string());
    }

    fn set_count(&mut self, bucket: StatusBucket, text: &str) {
        let slot = match bucket {
            StatusBucket::Pass => &mut self.count_pass,
            StatusBucket::Fail => &mut self.count_fail,
            StatusBucket::Warn => &mut self.count_warn,
            StatusBucket::Unknown => return,
        };
        *slot = Some(text.to_string());
    }

    fn set_status_summary(&mut self, text: &str) {
        self.status_summary = Some(text.to_string());
    }

    fn set_per_file(&mut self, table: &PerFileTable) {
        self.per_file = Some(table.clone());
    }

    fn set_top_failed(&mut self, list: &TopFailedList) {
        self.top_failed = Some(list.clone());
    }

    fn set_raw_json(&mut self, text: &str) {
        self.raw_json = Some(text.to_string());
    }
}

impl ScanSurface for MemorySurface {
    fn set_scan_status(&mut self, text: &str) {
        self.scan_status = Some(text.to_string());
        self.scan_history.push(text.to_string());
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = Some(enabled);
    }

    fn request_reload(&mut self) {
        self.reloads += 1;
    }
}
