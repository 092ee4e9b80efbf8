// Report payload served by GET /api/processed.
//
// Every field is optional on the wire and the backend is not trusted to get
// the types right. A section or field of the wrong type falls back to its
// empty default instead of failing the whole report.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The processed report: aggregate counts, per-file breakdown, top failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Summary,
    #[serde(default, deserialize_with = "lenient")]
    pub per_file: BTreeMap<String, StatusCounts>,
    #[serde(default, deserialize_with = "lenient_checks")]
    pub top_failed: Vec<FailedCheck>,
    /// Fields the dashboard doesn't interpret (`counts_by_status`, `meta`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A report as it came off the wire: the decoded view plus the exact payload,
/// which is what the raw JSON view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedReport {
    pub report: Report,
    pub raw: Value,
}

impl FetchedReport {
    /// Decode `raw` without giving it up. Fails only when `raw` is not an object.
    pub fn from_value(raw: Value) -> serde_json::Result<Self> {
        let report = Report::deserialize(&raw)?;
        Ok(Self { report, raw })
    }
}

impl From<Report> for FetchedReport {
    /// For reports built locally, where the typed report is the payload.
    fn from(report: Report) -> Self {
        let raw = serde_json::to_value(&report).unwrap_or(Value::Null);
        Self { report, raw }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, deserialize_with = "lenient")]
    pub counts: StatusCounts,
    #[serde(
        default,
        deserialize_with = "count_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_checks: Option<u64>,
}

impl Summary {
    /// `total_checks` when set and non-zero, otherwise the sum of every count.
    pub fn total(&self) -> u64 {
        match self.total_checks {
            Some(total) if total > 0 => total,
            _ => self.counts.sum(),
        }
    }
}

/// One of the four buckets every status label collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBucket {
    Pass,
    Fail,
    Warn,
    Unknown,
}

impl StatusBucket {
    pub const ALL: [StatusBucket; 4] = [
        StatusBucket::Pass,
        StatusBucket::Fail,
        StatusBucket::Warn,
        StatusBucket::Unknown,
    ];

    /// Map a raw status label onto its bucket, ignoring case.
    ///
    /// Returns `None` for labels that belong to no bucket (e.g. `ERROR`),
    /// which still count toward a summary total but never toward a bucket.
    pub fn canonicalize(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "warn" | "warning" => Some(Self::Warn),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status label -> count, exactly as the backend spelled the labels.
///
/// Decoding never fails: a count that is null or not a number reads as 0, and
/// anything other than an object reads as no counts at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(pub BTreeMap<String, u64>);

impl<'de> Deserialize<'de> for StatusCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let counts = match Value::deserialize(deserializer)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(label, count)| (label, count_of(&count).unwrap_or(0)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Ok(Self(counts))
    }
}

impl StatusCounts {
    /// Count for a canonical bucket.
    ///
    /// Several spellings may be present at once (`PASS` and `pass`). The
    /// first non-zero one wins, in byte order of the label, which puts
    /// upper-case before capitalised before lower-case:
    /// `PASS, Pass, pass` and `WARN, Warn, Warning, warn, warning`.
    pub fn get(&self, bucket: StatusBucket) -> u64 {
        self.0
            .iter()
            .filter(|(label, _)| StatusBucket::canonicalize(label) == Some(bucket))
            .map(|(_, count)| *count)
            .find(|count| *count > 0)
            .unwrap_or(0)
    }

    /// pass + fail + warn + unknown, each resolved through [`Self::get`].
    /// Saturates at `u64::MAX`.
    pub fn bucket_total(&self) -> u64 {
        StatusBucket::ALL
            .iter()
            .map(|b| self.get(*b))
            .fold(0, u64::saturating_add)
    }

    /// Sum of every raw value, including labels outside the four buckets.
    /// Saturates at `u64::MAX`.
    pub fn sum(&self) -> u64 {
        self.0.values().copied().fold(0, u64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels and counts in lexicographic label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A failed check as listed under `top_failed`. Every field may be missing,
/// and a field of the wrong type is treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedCheck {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub check_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// Either a plain string or an arbitrary JSON structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Value>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub remediation: Option<String>,
    #[serde(
        rename = "_source_file",
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_file: Option<String>,
    #[serde(
        default,
        deserialize_with = "array_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_results: Option<Vec<Value>>,
}

/// Response body of POST /api/scan/start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStartResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Job state reported by GET /api/scan/status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    Failed,
    NotFound,
    Error,
    /// Unrecognised or missing status. Not terminal.
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatusResponse {
    #[serde(default)]
    pub status: JobState,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,
}

/// JavaScript-style truthiness for loosely typed JSON fields.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A non-negative integer count. Floats are truncated; anything else is `None`.
fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    }
}

/// Decode `T` from whatever is there, or fall back to `T::default()`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Failed checks, skipping entries that are not objects.
fn lenient_checks<'de, D>(deserializer: D) -> Result<Vec<FailedCheck>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn count_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(count_of))
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn array_or_none<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
