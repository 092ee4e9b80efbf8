// Colored terminal rendering of the dashboard.
//
// `TerminalSurface` collects the latest value of every mount point and prints
// the whole dashboard in one pass. `TerminalScanSurface` shows scan progress
// on an indicatif spinner.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::{
    FailureCard, PerFileTable, RenderSurface, TopFailedList, NOT_AVAILABLE, NO_FAILURES,
    NO_PER_FILE_DATA, PLACEHOLDER,
};
use crate::report::model::StatusBucket;
use crate::scan::ScanSurface;

/// Width of the file-name column in the per-file table.
const FILE_COLUMN_WIDTH: usize = 44;

pub struct TerminalSurface {
    total_checks: String,
    count_pass: String,
    count_fail: String,
    count_warn: String,
    status_summary: Option<String>,
    per_file: Option<PerFileTable>,
    top_failed: Option<TopFailedList>,
    raw_json: Option<String>,
    fetch_error: Option<String>,
    show_details: bool,
    show_raw: bool,
    source: String,
    rendered_at: DateTime<Local>,
}

impl TerminalSurface {
    /// `source` names where the report came from (backend URL or file path).
    pub fn new(source: &str, show_details: bool, show_raw: bool) -> Self {
        Self {
            total_checks: PLACEHOLDER.to_string(),
            count_pass: PLACEHOLDER.to_string(),
            count_fail: PLACEHOLDER.to_string(),
            count_warn: PLACEHOLDER.to_string(),
            status_summary: None,
            per_file: None,
            top_failed: None,
            raw_json: None,
            fetch_error: None,
            show_details,
            show_raw,
            source: source.to_string(),
            rendered_at: Local::now(),
        }
    }

    /// Print the dashboard to stdout.
    pub fn print(&self) {
        print!("{}", self.to_text());
    }

    /// The dashboard as it would be printed.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_header(&mut out);
        self.write_per_file(&mut out);
        self.write_top_failed(&mut out);
        self.write_raw(&mut out);
        out
    }

    fn write_header(&self, out: &mut String) {
        let _ = writeln!(out, "\n{}", "=== CIS Compliance Dashboard ===".bold());
        let _ = writeln!(
            out,
            "{}",
            format!(
                "  {} ({})",
                self.source,
                self.rendered_at.format("%Y-%m-%d %H:%M:%S")
            )
            .dimmed()
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  Total checks: {}   Pass: {}   Fail: {}   Warn: {}",
            self.total_checks.bold(),
            self.count_pass.green(),
            self.count_fail.red(),
            self.count_warn.yellow(),
        );
        if let Some(summary) = &self.status_summary {
            let _ = writeln!(out, "  {}", summary.dimmed());
        }
    }

    fn write_per_file(&self, out: &mut String) {
        let Some(table) = &self.per_file else {
            return;
        };
        let _ = writeln!(out, "\n{}", "=== Per-file breakdown ===".bold());
        let _ = writeln!(
            out,
            "  {:<width$} {:>6} {:>6} {:>6} {:>8}",
            "File".dimmed(),
            "Pass".dimmed(),
            "Fail".dimmed(),
            "Warn".dimmed(),
            "Unknown".dimmed(),
            width = FILE_COLUMN_WIDTH,
        );
        let _ = writeln!(out, "  {}", "-".repeat(FILE_COLUMN_WIDTH + 30).dimmed());

        match table {
            PerFileTable::Empty => {
                let _ = writeln!(out, "  {NO_PER_FILE_DATA}");
            }
            PerFileTable::Rows(rows) => {
                for row in rows {
                    let _ = writeln!(
                        out,
                        "  {:<width$} {:>6} {:>6} {:>6} {:>8}",
                        row.source,
                        row.pass,
                        colorize_fail(row.fail),
                        row.warn,
                        row.unknown,
                        width = FILE_COLUMN_WIDTH,
                    );
                }
            }
        }
    }

    fn write_top_failed(&self, out: &mut String) {
        let Some(list) = &self.top_failed else {
            return;
        };
        let cards = match list {
            TopFailedList::Empty => {
                let _ = writeln!(out, "\n{}", "=== Top failed checks ===".bold());
                let _ = writeln!(out, "  {}", NO_FAILURES.dimmed());
                return;
            }
            TopFailedList::Cards(cards) => cards,
        };

        let _ = writeln!(
            out,
            "\n{}",
            format!("=== Top failed checks ({}) ===", cards.len()).bold()
        );
        for (i, card) in cards.iter().enumerate() {
            let _ = writeln!(out, "\n  {}. {}", i + 1, card.title.bold());
            if !card.reason.is_empty() {
                let _ = writeln!(out, "     {}", card.reason.dimmed());
            }
            if !card.details_visible {
                continue;
            }
            let remediation = match &card.details.remediation {
                Some(text) => text.normal(),
                None => NOT_AVAILABLE.italic(),
            };
            let _ = writeln!(out, "     {} {}", "Remediation:".bold(), remediation);
            let _ = writeln!(out, "     {} {}", "Source:".bold(), card.details.source);
            if let Some(lines) = &card.details.line_results {
                for line in lines.lines() {
                    let _ = writeln!(out, "     {} {}", "|".dimmed(), line);
                }
            }
        }
        if cards.iter().any(|c| !c.details_visible) {
            let _ = writeln!(
                out,
                "\n  {}",
                "Run with --details to show remediation and line results.".dimmed()
            );
        }
    }

    fn write_raw(&self, out: &mut String) {
        // Fetch errors are always shown; the raw report only on request.
        if let Some(message) = &self.fetch_error {
            let _ = writeln!(out, "\n  {} {}", "Error:".red().bold(), message);
            return;
        }
        let Some(raw) = self.raw_json.as_ref().filter(|_| self.show_raw) else {
            return;
        };
        let _ = writeln!(out, "\n{}", "=== Raw report ===".bold());
        let _ = writeln!(out, "{raw}");
    }
}

impl RenderSurface for TerminalSurface {
    fn set_total_checks(&mut self, text: &str) {
        self.total_checks = text.to_string();
    }

    fn set_count(&mut self, bucket: StatusBucket, text: &str) {
        let slot = match bucket {
            StatusBucket::Pass => &mut self.count_pass,
            StatusBucket::Fail => &mut self.count_fail,
            StatusBucket::Warn => &mut self.count_warn,
            StatusBucket::Unknown => return,
        };
        *slot = text.to_string();
    }

    fn set_status_summary(&mut self, text: &str) {
        self.status_summary = Some(text.to_string());
    }

    fn set_per_file(&mut self, table: &PerFileTable) {
        self.per_file = Some(table.clone());
    }

    fn set_top_failed(&mut self, list: &TopFailedList) {
        let mut list = list.clone();
        // --details presses every card's "Details" control.
        if let (true, TopFailedList::Cards(cards)) = (self.show_details, &mut list) {
            cards.iter_mut().for_each(FailureCard::toggle_details);
        }
        self.top_failed = Some(list);
    }

    fn set_raw_json(&mut self, text: &str) {
        self.raw_json = Some(text.to_string());
        self.fetch_error = None;
    }

    fn set_fetch_error(&mut self, message: &str) {
        self.fetch_error = Some(message.to_string());
        self.raw_json = None;
    }
}

fn colorize_fail(count: u64) -> colored::ColoredString {
    if count > 0 {
        count.to_string().red()
    } else {
        count.to_string().normal()
    }
}

/// Scan progress on a spinner. The "trigger" is the `cisdash scan` command
/// itself, so re-enabling it means telling the user they can run it again.
pub struct TerminalScanSurface {
    spinner: ProgressBar,
    reload_requested: bool,
}

impl TerminalScanSurface {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self {
            spinner,
            reload_requested: false,
        }
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested
    }

    /// Stop the spinner, leaving the last message on screen.
    pub fn finish(&self) {
        let message = self.spinner.message();
        self.spinner.finish_and_clear();
        if !message.is_empty() {
            println!("  {message}");
        }
    }
}

impl Default for TerminalScanSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSurface for TerminalScanSurface {
    fn set_scan_status(&mut self, text: &str) {
        self.spinner.set_message(text.to_string());
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        if enabled {
            self.spinner
                .println(format!("  {}", "Run `cisdash scan` to try again.".dimmed()));
        }
    }

    fn request_reload(&mut self) {
        self.reload_requested = true;
    }
}
