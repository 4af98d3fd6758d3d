use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogStatus {
    Applied,
    Failed,
    UndoApplied,
    UndoFailed,
    Other(String),
}

impl LogStatus {
    pub fn slug(&self) -> &str {
        match self {
            LogStatus::Applied => "applied",
            LogStatus::Failed => "failed",
            LogStatus::UndoApplied => "undo_applied",
            LogStatus::UndoFailed => "undo_failed",
            LogStatus::Other(value) => value.as_str(),
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for LogStatus {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "applied" => LogStatus::Applied,
            "failed" => LogStatus::Failed,
            "undo_applied" => LogStatus::UndoApplied,
            "undo_failed" => LogStatus::UndoFailed,
            _ => LogStatus::Other(value.to_string()),
        })
    }
}

/// Immutable remote audit entry for one applied or failed action.
///
/// The status text, validation and explain payloads (explicit `null`
/// included) and unknown keys are kept verbatim so the record can be handed
/// back to the undo endpoint unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "ts")]
    pub timestamp: String,
    #[serde(rename = "status")]
    status_text: String,
    #[serde(rename = "sparql", default)]
    pub statement: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub validation: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub explain: Option<Value>,
    #[serde(
        rename = "undo_sparql",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub undo_statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A key that is present maps to `Some`, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl LogRecord {
    pub fn status(&self) -> LogStatus {
        match self.status_text.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }

    /// Status exactly as the log endpoint spelled it.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Only applied records that carry a compensating statement can be undone.
    pub fn can_undo(&self) -> bool {
        self.status() == LogStatus::Applied
            && self
                .undo_statement
                .as_deref()
                .map(|statement| !statement.trim().is_empty())
                .unwrap_or(false)
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|value| value.with_timezone(&Utc))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfStats {
    #[serde(rename = "n", default)]
    pub count: u64,
    #[serde(default)]
    pub p50_ms: f64,
    #[serde(default)]
    pub p95_ms: f64,
    #[serde(default)]
    pub max_ms: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FusekiStats {
    #[serde(default)]
    pub select: PerfStats,
    #[serde(default)]
    pub update: PerfStats,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCount {
    pub path: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfSnapshot {
    #[serde(default)]
    pub window_minutes: u32,
    #[serde(default)]
    pub http: PerfStats,
    #[serde(default)]
    pub fuseki: FusekiStats,
    #[serde(default)]
    pub top_http_paths: Vec<PathCount>,
}

impl PerfSnapshot {
    pub fn fuseki_select(&self) -> &PerfStats {
        &self.fuseki.select
    }

    pub fn fuseki_update(&self) -> &PerfStats {
        &self.fuseki.update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(status: &str, undo: Option<&str>) -> LogRecord {
        serde_json::from_value(json!({
            "ts": "2024-05-01T12:00:00Z",
            "status": status,
            "sparql": "INSERT DATA { <urn:a> <urn:b> <urn:c> }",
            "undo_sparql": undo,
        }))
        .unwrap()
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("APPLIED".parse::<LogStatus>().unwrap(), LogStatus::Applied);
        assert_eq!(
            "Undo_Failed".parse::<LogStatus>().unwrap(),
            LogStatus::UndoFailed
        );
        assert_eq!(
            "pending".parse::<LogStatus>().unwrap(),
            LogStatus::Other("pending".into())
        );
    }

    #[test]
    fn undo_requires_applied_status_and_statement() {
        assert!(record("Applied", Some("DELETE DATA { <urn:a> <urn:b> <urn:c> }")).can_undo());
        assert!(!record("applied", None).can_undo());
        assert!(!record("applied", Some("  ")).can_undo());
        assert!(!record("undo_applied", Some("DELETE DATA {}")).can_undo());
        assert!(!record("failed", Some("DELETE DATA {}")).can_undo());
    }

    #[test]
    fn record_keeps_opaque_payloads_for_round_trip() {
        let raw = json!({
            "ts": "2024-05-01T12:00:00Z",
            "status": "applied",
            "sparql": "INSERT DATA {}",
            "validation": {"ok": true, "errors": [], "warnings": ["w"]},
            "explain": {"kind": "INSERT", "lines": 1},
            "undo_sparql": "DELETE DATA {}",
        });
        let parsed: LogRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
        assert!(parsed.recorded_at().is_some());
    }

    #[test]
    fn record_round_trip_keeps_status_spelling_nulls_and_unknown_keys() {
        let raw = json!({
            "ts": "2024-05-01T12:00:00Z",
            "status": "Applied",
            "sparql": "INSERT DATA {}",
            "validation": null,
            "explain": null,
            "undo_sparql": "DELETE DATA {}",
            "duration_ms": 42,
            "actor": {"id": "ops"},
        });
        let parsed: LogRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.status(), LogStatus::Applied);
        assert_eq!(parsed.status_text(), "Applied");
        assert_eq!(parsed.validation, Some(Value::Null));
        assert_eq!(parsed.extra["duration_ms"], 42);
        assert!(parsed.can_undo());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }

    #[test]
    fn perf_snapshot_reads_wire_shape() {
        let perf: PerfSnapshot = serde_json::from_value(json!({
            "window_minutes": 60,
            "http": {"n": 12, "p50_ms": 8.5, "p95_ms": 40.0, "max_ms": 91.2},
            "fuseki": {"select": {"n": 3, "p50_ms": 4.0, "p95_ms": 9.0, "max_ms": 9.0}},
            "top_http_paths": [{"path": "/nl2sparql/preview", "count": 7}]
        }))
        .unwrap();
        assert_eq!(perf.http.count, 12);
        assert_eq!(perf.fuseki_select().count, 3);
        assert_eq!(perf.fuseki_update(), &PerfStats::default());
        assert_eq!(perf.top_http_paths[0].path, "/nl2sparql/preview");
    }
}
