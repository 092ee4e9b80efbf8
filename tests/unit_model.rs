// Unit tests for the report data model.
//
// Covers status-label canonicalization and its precedence rules, summary
// total derivation, and lenient deserialization of partial or mistyped payloads.

use cisdash::report::model::{is_truthy, JobState, ScanStatusResponse};
use cisdash::report::{Report, StatusBucket, StatusCounts, Summary};
use serde_json::json;

fn counts(pairs: &[(&str, u64)]) -> StatusCounts {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ============================================================
// StatusBucket::canonicalize
// ============================================================

#[test]
fn canonicalize_ignores_case() {
    for label in ["PASS", "Pass", "pass", "pAsS"] {
        assert_eq!(StatusBucket::canonicalize(label), Some(StatusBucket::Pass));
    }
    assert_eq!(StatusBucket::canonicalize("Fail"), Some(StatusBucket::Fail));
    assert_eq!(StatusBucket::canonicalize("UNKNOWN"), Some(StatusBucket::Unknown));
}

#[test]
fn canonicalize_warning_is_warn() {
    assert_eq!(StatusBucket::canonicalize("Warning"), Some(StatusBucket::Warn));
    assert_eq!(StatusBucket::canonicalize("warn"), Some(StatusBucket::Warn));
}

#[test]
fn canonicalize_rejects_other_labels() {
    assert_eq!(StatusBucket::canonicalize("ERROR"), None);
    assert_eq!(StatusBucket::canonicalize(""), None);
}

// ============================================================
// StatusCounts::get — precedence
// ============================================================

#[test]
fn missing_bucket_is_zero() {
    let c = counts(&[("PASS", 3)]);
    assert_eq!(c.get(StatusBucket::Fail), 0);
    assert_eq!(c.get(StatusBucket::Warn), 0);
}

#[test]
fn uppercase_variant_wins() {
    let c = counts(&[("PASS", 3), ("Pass", 7), ("pass", 9)]);
    assert_eq!(c.get(StatusBucket::Pass), 3);
}

#[test]
fn zero_variant_falls_through_to_next() {
    let c = counts(&[("PASS", 0), ("pass", 4)]);
    assert_eq!(c.get(StatusBucket::Pass), 4);
}

#[test]
fn warn_precedence_follows_spelling_order() {
    let c = counts(&[("warning", 1), ("Warning", 2), ("warn", 3)]);
    assert_eq!(c.get(StatusBucket::Warn), 2);

    let c = counts(&[("warning", 1), ("Warn", 5)]);
    assert_eq!(c.get(StatusBucket::Warn), 5);
}

#[test]
fn bucket_total_adds_four_buckets_only() {
    let c = counts(&[("PASS", 1), ("FAIL", 2), ("WARN", 3), ("UNKNOWN", 4), ("ERROR", 100)]);
    assert_eq!(c.bucket_total(), 10);
    assert_eq!(c.sum(), 110);
}

#[test]
fn sums_saturate_instead_of_overflowing() {
    let c = counts(&[("PASS", u64::MAX), ("FAIL", 1), ("ERROR", 7)]);
    assert_eq!(c.sum(), u64::MAX);
    assert_eq!(c.bucket_total(), u64::MAX);

    let r: Report = serde_json::from_value(json!({
        "summary": {"counts": {"PASS": u64::MAX, "FAIL": 1}}
    }))
    .unwrap();
    assert_eq!(r.summary.total(), u64::MAX);
}

// ============================================================
// Summary::total
// ============================================================

#[test]
fn total_derived_when_absent() {
    let s = Summary {
        counts: counts(&[("PASS", 3), ("fail", 2)]),
        total_checks: None,
    };
    assert_eq!(s.total(), 5);
}

#[test]
fn total_checks_preferred_when_set() {
    let s = Summary {
        counts: counts(&[("PASS", 3)]),
        total_checks: Some(42),
    };
    assert_eq!(s.total(), 42);
}

#[test]
fn zero_total_checks_is_treated_as_absent() {
    let s = Summary {
        counts: counts(&[("PASS", 3), ("FAIL", 1)]),
        total_checks: Some(0),
    };
    assert_eq!(s.total(), 4);
}

// ============================================================
// Deserialization
// ============================================================

#[test]
fn empty_object_is_empty_report() {
    let r: Report = serde_json::from_str("{}").unwrap();
    assert!(r.summary.counts.is_empty());
    assert!(r.per_file.is_empty());
    assert!(r.top_failed.is_empty());
}

#[test]
fn null_sections_become_defaults() {
    let r: Report =
        serde_json::from_value(json!({"summary": null, "per_file": null, "top_failed": null}))
            .unwrap();
    assert_eq!(r.summary.total(), 0);
    assert!(r.per_file.is_empty());
}

#[test]
fn unknown_fields_survive_a_round_trip() {
    let r: Report = serde_json::from_value(json!({
        "summary": {"counts": {"PASS": 1}, "total_checks": 1},
        "meta": {"source_path": "/output/results.json"}
    }))
    .unwrap();
    let back = serde_json::to_value(&r).unwrap();
    assert_eq!(back["meta"]["source_path"], "/output/results.json");
}

#[test]
fn failed_check_fields_are_optional() {
    let r: Report = serde_json::from_value(json!({
        "top_failed": [
            {},
            {"check_id": 12, "_source_file": "master.yaml", "reason": {"got": "x"}}
        ]
    }))
    .unwrap();
    assert_eq!(r.top_failed.len(), 2);
    assert!(r.top_failed[0].check_id.is_none());
    assert_eq!(r.top_failed[1].check_id.as_deref(), Some("12"));
    assert_eq!(r.top_failed[1].source_file.as_deref(), Some("master.yaml"));
    assert!(r.top_failed[1].reason.as_ref().unwrap().is_object());
}

#[test]
fn null_and_non_numeric_counts_read_as_zero() {
    let r: Report = serde_json::from_value(json!({
        "summary": {"counts": {"PASS": 3, "FAIL": null, "WARN": "many", "UNKNOWN": -2}},
        "per_file": {"master.yaml": {"PASS": 1.0, "FAIL": {}}, "node.yaml": null}
    }))
    .unwrap();

    let c = &r.summary.counts;
    assert_eq!(c.get(StatusBucket::Pass), 3);
    assert_eq!(c.get(StatusBucket::Fail), 0);
    assert_eq!(c.get(StatusBucket::Warn), 0);
    assert_eq!(c.get(StatusBucket::Unknown), 0);
    // Still listed, so the summary line shows the label.
    assert_eq!(c.iter().count(), 4);
    assert_eq!(r.summary.total(), 3);

    assert_eq!(r.per_file["master.yaml"].get(StatusBucket::Pass), 1);
    assert_eq!(r.per_file["master.yaml"].get(StatusBucket::Fail), 0);
    assert!(r.per_file["node.yaml"].is_empty());
}

#[test]
fn mistyped_total_checks_falls_back_to_sum() {
    let r: Report = serde_json::from_value(json!({
        "summary": {"counts": {"PASS": 2}, "total_checks": "lots"}
    }))
    .unwrap();
    assert_eq!(r.summary.total_checks, None);
    assert_eq!(r.summary.total(), 2);
}

#[test]
fn non_array_line_results_is_none() {
    let r: Report = serde_json::from_value(json!({
        "top_failed": [
            {"check_id": "1.1", "line_results": "none"},
            {"check_id": "1.2", "line_results": {"a": 1}},
            {"check_id": "1.3", "line_results": ["x"]}
        ]
    }))
    .unwrap();
    assert_eq!(r.top_failed.len(), 3);
    assert_eq!(r.top_failed[0].line_results, None);
    assert_eq!(r.top_failed[1].line_results, None);
    assert_eq!(r.top_failed[2].line_results, Some(vec![json!("x")]));
}

#[test]
fn non_string_text_fields_are_none() {
    let r: Report = serde_json::from_value(json!({
        "top_failed": [{
            "check_id": "1.1",
            "remediation": ["step one"],
            "description": 42,
            "_source_file": {"path": "master.yaml"},
            "status": false
        }]
    }))
    .unwrap();
    let check = &r.top_failed[0];
    assert_eq!(check.check_id.as_deref(), Some("1.1"));
    assert_eq!(check.remediation, None);
    assert_eq!(check.description, None);
    assert_eq!(check.source_file, None);
    assert_eq!(check.status, None);
}

#[test]
fn mistyped_sections_become_defaults() {
    let r: Report = serde_json::from_value(json!({
        "summary": "oops",
        "per_file": [1, 2],
        "top_failed": {"check_id": "1.1"}
    }))
    .unwrap();
    assert!(r.summary.counts.is_empty());
    assert!(r.per_file.is_empty());
    assert!(r.top_failed.is_empty());
}

#[test]
fn non_object_failed_checks_are_skipped() {
    let r: Report = serde_json::from_value(json!({
        "top_failed": ["1.1", null, {"check_id": "1.2"}]
    }))
    .unwrap();
    assert_eq!(r.top_failed.len(), 1);
    assert_eq!(r.top_failed[0].check_id.as_deref(), Some("1.2"));
}

#[test]
fn scan_status_accepts_unrecognised_states() {
    let s: ScanStatusResponse = serde_json::from_str(r#"{"status": "pending"}"#).unwrap();
    assert_eq!(s.status, JobState::Other);
    let s: ScanStatusResponse = serde_json::from_str(r#"{"status": "not_found"}"#).unwrap();
    assert_eq!(s.status, JobState::NotFound);
}

#[test]
fn scan_status_without_status_is_other() {
    let s: ScanStatusResponse = serde_json::from_str(r#"{"error": "x"}"#).unwrap();
    assert_eq!(s.status, JobState::Other);
    assert_eq!(s.error.as_deref(), Some("x"));

    let s: ScanStatusResponse = serde_json::from_str("{}").unwrap();
    assert_eq!(s.status, JobState::Other);
}

#[test]
fn truthiness_matches_loose_json_rules() {
    assert!(!is_truthy(&json!(null)));
    assert!(!is_truthy(&json!("")));
    assert!(!is_truthy(&json!(0)));
    assert!(!is_truthy(&json!(false)));
    assert!(is_truthy(&json!({})));
    assert!(is_truthy(&json!([])));
    assert!(is_truthy(&json!("x")));
}
