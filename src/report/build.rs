// Report builder — turns raw scanner findings into the processed Report.
//
// The scanner writes a results.json whose shape has drifted over time: a bare
// list of findings, or an object wrapping the list under one of several keys.
// `extract_findings` accepts all of them; `build_report` does the counting.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::model::{FailedCheck, Report, StatusCounts, Summary};

/// Most failed checks the report lists.
pub const TOP_FAILED_LIMIT: usize = 20;

/// Most `line_results` entries kept per failed check.
pub const LINE_RESULTS_LIMIT: usize = 8;

/// Keys that may wrap the findings list, checked in order.
const WRAPPER_KEYS: [&str; 3] = ["findings", "results", "checks"];

/// Read and parse a scanner results file, returning its findings.
pub async fn load_findings(path: &Path) -> Result<Vec<Value>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not load JSON: {}", path.display()))?;
    let data: Value = serde_json::from_str(&text)
        .with_context(|| format!("Could not load JSON: {}", path.display()))?;
    Ok(extract_findings(data))
}

/// Pull the findings list out of whatever shape the scanner produced.
///
/// A top-level list is used as-is. An object is searched for the wrapper
/// keys first, then for the first list-valued field. Anything else yields
/// no findings.
pub fn extract_findings(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items;
                    }
                }
            }
            map.into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Collapse the scanner's free-form status into PASS / FAIL / WARN / UNKNOWN.
pub fn normalize_status(status: Option<&Value>) -> &'static str {
    let raw = match status {
        Some(Value::String(s)) => s.trim().to_ascii_uppercase(),
        Some(v) if super::model::is_truthy(v) => v.to_string().to_ascii_uppercase(),
        _ => return "UNKNOWN",
    };
    match raw.as_str() {
        "PASS" | "PASSED" | "SUCCESS" => "PASS",
        "FAIL" | "FAILED" | "ERROR" => "FAIL",
        "WARN" | "WARNING" => "WARN",
        _ => "UNKNOWN",
    }
}

/// Build the processed report from raw findings.
///
/// Non-object findings are skipped. Failed checks carrying `line_results`
/// sort ahead of those without, then by check id as text.
pub fn build_report(findings: &[Value], source_path: &str) -> Report {
    let mut total = 0u64;
    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    let mut per_file: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    let mut failed: Vec<FailedCheck> = Vec::new();

    for item in findings {
        let Some(obj) = item.as_object() else {
            continue;
        };
        total += 1;

        let status = normalize_status(obj.get("status"));
        *by_status.entry(status.to_string()).or_default() += 1;

        let source = source_of(obj);
        *per_file
            .entry(source.clone())
            .or_default()
            .entry(status.to_string())
            .or_default() += 1;

        if status == "FAIL" {
            failed.push(failed_check(obj, status, source));
        }
    }

    failed.sort_by_key(|c| (c.line_results.is_none(), c.check_id.clone().unwrap_or_default()));
    failed.truncate(TOP_FAILED_LIMIT);

    debug!(
        total,
        failed = failed.len(),
        files = per_file.len(),
        "Built processed report"
    );

    let counts = StatusCounts(by_status);
    let mut extra = Map::new();
    extra.insert(
        "counts_by_status".to_string(),
        serde_json::to_value(&counts).unwrap_or(Value::Null),
    );
    extra.insert("meta".to_string(), json!({ "source_path": source_path }));

    Report {
        summary: Summary {
            counts,
            total_checks: Some(total),
        },
        per_file: per_file
            .into_iter()
            .map(|(src, counts)| (src, StatusCounts(counts)))
            .collect(),
        top_failed: failed,
        extra,
    }
}

fn source_of(obj: &Map<String, Value>) -> String {
    ["_source_file", "source"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| super::model::is_truthy(v))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn failed_check(obj: &Map<String, Value>, status: &str, source: String) -> FailedCheck {
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

    let check_id = match obj.get("check_id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let line_results = match obj.get("line_results") {
        Some(Value::Array(lines)) => {
            Some(lines.iter().take(LINE_RESULTS_LIMIT).cloned().collect())
        }
        _ => None,
    };

    FailedCheck {
        check_id,
        description: text("description"),
        status: Some(status.to_string()),
        reason: obj.get("reason").filter(|v| !v.is_null()).cloned(),
        remediation: text("remediation"),
        source_file: Some(source),
        line_results,
    }
}
