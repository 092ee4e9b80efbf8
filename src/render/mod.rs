// Report rendering — turns a Report into updates on a RenderSurface.
//
// The surface has one method per mount point of the dashboard. Each render
// function computes plain view values and hands them over; the surface decides
// how they look (colored terminal text, an in-memory snapshot, ...). Every
// call replaces what the target previously showed.

pub mod memory;
pub mod terminal;

use serde::Serialize;
use serde_json::Value;

use crate::client::FetchError;
use crate::report::model::{
    is_truthy, FailedCheck, FetchedReport, StatusBucket, StatusCounts, Summary,
};

/// Shown wherever a value is missing.
pub const PLACEHOLDER: &str = "—";
pub const NO_STATUS_DATA: &str = "No status data available";
pub const NO_PER_FILE_DATA: &str = "No per-file data";
pub const NO_FAILURES: &str = "No failures found";
pub const UNNAMED_CHECK: &str = "Unnamed check";
pub const NOT_AVAILABLE: &str = "n/a";
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Longest reason line, in characters.
pub const REASON_MAX_CHARS: usize = 200;

/// Separator between `key: count` pairs in the status summary line.
const SUMMARY_SEPARATOR: &str = "  •  ";

/// The dashboard's mount points.
pub trait RenderSurface {
    fn set_total_checks(&mut self, text: &str);
    /// Only pass, fail and warn have a counter; unknown is shown per file.
    fn set_count(&mut self, bucket: StatusBucket, text: &str);
    fn set_status_summary(&mut self, text: &str);
    fn set_per_file(&mut self, table: &PerFileTable);
    fn set_top_failed(&mut self, list: &TopFailedList);
    fn set_raw_json(&mut self, text: &str);

    /// A failed fetch. Shares the raw JSON slot unless the surface keeps
    /// errors apart.
    fn set_fetch_error(&mut self, message: &str) {
        self.set_raw_json(message);
    }
}

/// Body of the per-file table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum PerFileTable {
    /// One row spanning all five columns with [`NO_PER_FILE_DATA`].
    Empty,
    Rows(Vec<PerFileRow>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerFileRow {
    pub source: String,
    pub pass: u64,
    pub fail: u64,
    pub warn: u64,
    pub unknown: u64,
}

impl PerFileRow {
    /// Saturates at `u64::MAX`.
    pub fn total(&self) -> u64 {
        [self.pass, self.fail, self.warn, self.unknown]
            .into_iter()
            .fold(0, u64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "cards", rename_all = "snake_case")]
pub enum TopFailedList {
    /// [`NO_FAILURES`].
    Empty,
    Cards(Vec<FailureCard>),
}

/// One failed check as a collapsible card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureCard {
    pub title: String,
    pub reason: String,
    pub details: CardDetails,
    /// Details start hidden; the "Details" control flips this.
    pub details_visible: bool,
}

impl FailureCard {
    pub fn toggle_details(&mut self) {
        self.details_visible = !self.details_visible;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDetails {
    /// `None` renders as the [`NOT_AVAILABLE`] marker.
    pub remediation: Option<String>,
    pub source: String,
    /// Preformatted block, one line result per line.
    pub line_results: Option<String>,
}

/// Write total, pass, fail and warn counters plus the status summary line.
///
/// Every counter is always a number here (zero included); the placeholder only
/// appears when there is no report at all, see [`render_fetch_error`].
pub fn render_summary(summary: &Summary, surface: &mut dyn RenderSurface) {
    let counts = &summary.counts;

    surface.set_total_checks(&summary.total().to_string());
    for bucket in [StatusBucket::Pass, StatusBucket::Fail, StatusBucket::Warn] {
        surface.set_count(bucket, &counts.get(bucket).to_string());
    }
    surface.set_status_summary(&status_summary_text(counts));
}

fn status_summary_text(counts: &StatusCounts) -> String {
    if counts.is_empty() {
        return NO_STATUS_DATA.to_string();
    }
    counts
        .iter()
        .map(|(label, count)| format!("{label}: {count}"))
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

/// Write the per-file table, busiest files first.
pub fn render_per_file<'a, I>(per_file: I, surface: &mut dyn RenderSurface)
where
    I: IntoIterator<Item = (&'a String, &'a StatusCounts)>,
{
    surface.set_per_file(&per_file_table(per_file));
}

/// Build the per-file table without rendering it.
pub fn per_file_table<'a, I>(per_file: I) -> PerFileTable
where
    I: IntoIterator<Item = (&'a String, &'a StatusCounts)>,
{
    let mut rows: Vec<PerFileRow> = per_file
        .into_iter()
        .map(|(source, counts)| PerFileRow {
            source: source.clone(),
            pass: counts.get(StatusBucket::Pass),
            fail: counts.get(StatusBucket::Fail),
            warn: counts.get(StatusBucket::Warn),
            unknown: counts.get(StatusBucket::Unknown),
        })
        .collect();

    if rows.is_empty() {
        return PerFileTable::Empty;
    }
    rows.sort_by(|a, b| b.total().cmp(&a.total()));
    PerFileTable::Rows(rows)
}

/// Write one card per failed check.
pub fn render_top_failed(list: &[FailedCheck], surface: &mut dyn RenderSurface) {
    surface.set_top_failed(&top_failed_list(list));
}

pub fn top_failed_list(list: &[FailedCheck]) -> TopFailedList {
    if list.is_empty() {
        return TopFailedList::Empty;
    }
    TopFailedList::Cards(list.iter().map(failure_card).collect())
}

/// Build the card for one failed check, degrading field by field.
pub fn failure_card(check: &FailedCheck) -> FailureCard {
    FailureCard {
        title: card_title(check),
        reason: card_reason(check),
        details: CardDetails {
            remediation: non_empty(check.remediation.as_deref()).map(str::to_string),
            source: non_empty(check.source_file.as_deref())
                .unwrap_or(UNKNOWN_SOURCE)
                .to_string(),
            line_results: check
                .line_results
                .as_deref()
                .filter(|lines| !lines.is_empty())
                .map(|lines| lines.iter().map(line_text).collect::<Vec<_>>().join("\n")),
        },
        details_visible: false,
    }
}

fn card_title(check: &FailedCheck) -> String {
    if let Some(id) = non_empty(check.check_id.as_deref()) {
        return format!("{id} — {}", check.source_file.as_deref().unwrap_or(""));
    }
    non_empty(check.description.as_deref())
        .unwrap_or(UNNAMED_CHECK)
        .to_string()
}

fn card_reason(check: &FailedCheck) -> String {
    match &check.reason {
        Some(Value::String(s)) if !s.is_empty() => return s.clone(),
        Some(v) if !v.is_string() && is_truthy(v) => {
            return take_chars(&v.to_string(), REASON_MAX_CHARS);
        }
        _ => {}
    }
    non_empty(check.description.as_deref())
        .map(|d| take_chars(d, REASON_MAX_CHARS))
        .unwrap_or_default()
}

fn line_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// First `max_chars` characters of `text`, cut on a character boundary.
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Render a whole report: raw JSON, summary, per-file table, top failures.
///
/// The raw JSON slot shows the payload as received, not the decoded view.
pub fn render_report(fetched: &FetchedReport, surface: &mut dyn RenderSurface) {
    let report = &fetched.report;
    let raw = serde_json::to_string_pretty(&fetched.raw).unwrap_or_default();
    surface.set_raw_json(&raw);
    render_summary(&report.summary, surface);
    render_per_file(&report.per_file, surface);
    render_top_failed(&report.top_failed, surface);
}

/// Show a failed fetch: the error in the raw JSON slot, placeholders in the counters.
pub fn render_fetch_error(error: &FetchError, surface: &mut dyn RenderSurface) {
    surface.set_fetch_error(&format!("Failed to fetch processed data: {error}"));
    surface.set_total_checks(PLACEHOLDER);
    for bucket in [StatusBucket::Pass, StatusBucket::Fail, StatusBucket::Warn] {
        surface.set_count(bucket, PLACEHOLDER);
    }
}
