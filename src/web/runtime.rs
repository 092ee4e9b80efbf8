// Runtime security alerts: Tetragon events exported as NDJSON.
//
// Each line of the log is one event object keyed by its kind
// (`process_exec`, `process_tracepoint`, ...). The backend drops the noise the
// monitoring tooling makes itself, lists the most recent alerts, and
// summarizes them by event name, process and severity.

use std::collections::{BTreeMap, HashMap};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;

/// Most alerts the list endpoint returns.
pub const ALERT_LIMIT: usize = 1000;

/// Entries kept in the by-type and by-process rankings.
pub const RANKING_LIMIT: usize = 10;

const UNKNOWN: &str = "unknown";

/// Tetragon event kinds, in the order an event is checked for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Tracepoint,
    Exec,
    Kprobe,
    Exit,
}

impl EventKind {
    const ALL: [EventKind; 4] = [
        EventKind::Tracepoint,
        EventKind::Exec,
        EventKind::Kprobe,
        EventKind::Exit,
    ];

    /// The key the event body sits under, which is also the filter name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tracepoint => "process_tracepoint",
            Self::Exec => "process_exec",
            Self::Kprobe => "process_kprobe",
            Self::Exit => "process_exit",
        }
    }
}

/// One alert's event body and its kind.
struct Event<'a> {
    kind: EventKind,
    body: &'a Value,
}

impl<'a> Event<'a> {
    fn of(alert: &'a Value) -> Option<Self> {
        let obj = alert.as_object()?;
        EventKind::ALL
            .into_iter()
            .find_map(|kind| obj.get(kind.as_str()).map(|body| Event { kind, body }))
    }

    fn binary(&self) -> Option<&'a str> {
        self.body.get("process")?.get("binary")?.as_str()
    }

    /// Only tracepoints carry a subsystem.
    fn subsystem(&self) -> Option<&'a str> {
        match self.kind {
            EventKind::Tracepoint => self.body.get("subsys").and_then(Value::as_str),
            _ => None,
        }
    }

    /// What the stats group this alert under.
    fn name(&self) -> String {
        let text_or = |key: &str, fallback: &str| {
            self.body
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        match self.kind {
            EventKind::Tracepoint => text_or("event", UNKNOWN),
            EventKind::Exec => "execve".to_string(),
            EventKind::Kprobe => text_or("function_name", "kprobe"),
            EventKind::Exit => UNKNOWN.to_string(),
        }
    }

    fn process(&self) -> String {
        match self.kind {
            EventKind::Exit => UNKNOWN.to_string(),
            _ => self.binary().unwrap_or(UNKNOWN).to_string(),
        }
    }
}

/// Which alerts the runtime endpoints show.
#[derive(Debug, Clone, Copy)]
pub struct AlertFilter<'a> {
    /// Substrings of `process.binary` that drop an alert.
    pub excluded_binaries: &'a [String],
    /// Event kinds to keep. Empty keeps all.
    pub event_types: &'a [String],
    /// Tracepoint subsystems to keep. Empty keeps all.
    pub subsystems: &'a [String],
}

impl<'a> AlertFilter<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        Self {
            excluded_binaries: &config.excluded_binaries,
            event_types: &config.included_event_types,
            subsystems: &config.included_subsystems,
        }
    }

    /// Events of no known kind are never shown.
    pub fn includes(&self, alert: &Value) -> bool {
        let Some(event) = Event::of(alert) else {
            return false;
        };

        if !self.event_types.is_empty()
            && !self.event_types.iter().any(|t| t == event.kind.as_str())
        {
            return false;
        }

        if let Some(subsys) = event.subsystem().filter(|s| !s.is_empty()) {
            if !self.subsystems.is_empty() && !self.subsystems.iter().any(|s| s == subsys) {
                return false;
            }
        }

        let binary = event.binary().unwrap_or("");
        !self
            .excluded_binaries
            .iter()
            .any(|excluded| binary.contains(excluded.as_str()))
    }
}

/// Parse an NDJSON alert log, keeping what the filter lets through.
/// Blank and malformed lines are skipped.
pub fn parse_alerts(text: &str, filter: &AlertFilter<'_>) -> Vec<Value> {
    let mut alerts = Vec::new();
    let mut malformed = 0usize;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<Value>(line) {
            Ok(alert) if filter.includes(&alert) => alerts.push(alert),
            Ok(_) => {}
            Err(_) => malformed += 1,
        }
    }

    if malformed > 0 {
        debug!(malformed, kept = alerts.len(), "Skipped malformed runtime alert lines");
    }
    alerts
}

/// Newest first by `time`, capped at [`ALERT_LIMIT`]. Alerts with the same
/// time keep their log order.
pub fn most_recent(mut alerts: Vec<Value>) -> Vec<Value> {
    alerts.sort_by(|a, b| time_of(b).cmp(time_of(a)));
    alerts.truncate(ALERT_LIMIT);
    alerts
}

// RFC 3339 timestamps sort chronologically as text.
fn time_of(alert: &Value) -> &str {
    alert.get("time").and_then(Value::as_str).unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Classify by keywords in the event name, most severe match first.
    pub fn classify(event_name: &str) -> Self {
        let name = event_name.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if mentions(&["setuid", "capset", "sigkill", "unshare", "mount"]) {
            Self::Critical
        } else if mentions(&["clone", "accept", "connect", "bind"]) {
            Self::High
        } else if mentions(&["execve", "ptrace", "chmod", "chown"]) {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Counts ranked highest first, ties in first-seen order. Serializes as a
/// JSON object in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking(pub Vec<(String, u64)>);

impl Ranking {
    fn top(names: impl IntoIterator<Item = String>, limit: usize) -> Self {
        let mut ranked: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for name in names {
            match index.get(&name) {
                Some(&i) => ranked[i].1 += 1,
                None => {
                    index.insert(name.clone(), ranked.len());
                    ranked.push((name, 1));
                }
            }
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        Self(ranked)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Ranking {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertStats {
    pub total: usize,
    pub by_type: Ranking,
    pub by_process: Ranking,
    pub by_severity: BTreeMap<Severity, u64>,
}

/// Summarize already-filtered alerts. Unlike the list, not capped.
pub fn alert_stats(alerts: &[Value]) -> AlertStats {
    let events: Vec<(String, String)> = alerts
        .iter()
        .map(|alert| match Event::of(alert) {
            Some(event) => (event.name(), event.process()),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        })
        .collect();

    let mut by_severity = BTreeMap::new();
    for (name, _) in &events {
        *by_severity.entry(Severity::classify(name)).or_insert(0) += 1;
    }

    AlertStats {
        total: alerts.len(),
        by_type: Ranking::top(events.iter().map(|(name, _)| name.clone()), RANKING_LIMIT),
        by_process: Ranking::top(events.into_iter().map(|(_, process)| process), RANKING_LIMIT),
        by_severity,
    }
}
