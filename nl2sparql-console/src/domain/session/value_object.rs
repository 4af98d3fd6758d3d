use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Read-only statements start with SELECT or ASK, optionally preceded by
/// PREFIX declarations on their own lines.
static READ_QUERY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:PREFIX\s+[^\n]+\n\s*)*(?:SELECT|ASK)\b").expect("read query regex")
});

/// SPARQL text currently being composed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Statement(String);

impl Statement {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Lexical guard for the read-only endpoint. Does not parse SPARQL.
    pub fn is_read_query(&self) -> bool {
        READ_QUERY_PATTERN.is_match(&self.0)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Statement {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Statement {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Serialize for Statement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Statement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedUris {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Outcome of the remote validator. Immutable once attached to a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub used_uris: UsedUris,
}

impl ValidationReport {
    pub fn used_classes(&self) -> &[String] {
        &self.used_uris.classes
    }

    pub fn used_properties(&self) -> &[String] {
        &self.used_uris.properties
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainReport {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub predicates: Vec<String>,
    #[serde(rename = "lines", default)]
    pub line_count: u32,
}

/// Opaque, time-limited authorization returned by preview or generate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationToken {
    value: String,
    issued_at: DateTime<Utc>,
    ttl_seconds: i64,
    expires_at: DateTime<Utc>,
}

impl ConfirmationToken {
    /// `issued_at` is the client clock at the moment the issuing response is applied.
    ///
    /// Returns `None` when `issued_at + ttl_seconds` is not a representable instant.
    pub fn issue(
        value: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl_seconds: i64,
    ) -> Option<Self> {
        let expires_at = Duration::try_seconds(ttl_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))?;
        Some(Self {
            value: value.into(),
            issued_at,
            ttl_seconds,
            expires_at,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        seconds_until(self.expires_at(), now)
    }
}

/// Whole seconds until `deadline`, floored, never negative.
pub fn seconds_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (deadline - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        millis / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn read_query_guard_accepts_select_and_ask() {
        assert!(Statement::from("SELECT ?s WHERE { ?s ?p ?o }").is_read_query());
        assert!(Statement::from("  ask { ?s ?p ?o }").is_read_query());
        assert!(Statement::from(
            "PREFIX voc: <http://meta-pfarrerbuch.evangelische-archive.de/vocabulary#>\n\
             PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             SELECT ?person WHERE { ?person a voc:Pfarrer-in } LIMIT 1"
        )
        .is_read_query());
    }

    #[test]
    fn read_query_guard_rejects_updates() {
        assert!(!Statement::from("INSERT DATA { <urn:a> <urn:b> <urn:c> }").is_read_query());
        assert!(!Statement::from(
            "PREFIX voc: <http://meta-pfarrerbuch.evangelische-archive.de/vocabulary#>\n\
             DELETE WHERE { ?s voc:vorname ?o }"
        )
        .is_read_query());
        assert!(!Statement::from("SELECTED ?x").is_read_query());
        assert!(!Statement::from("").is_read_query());
    }

    #[test]
    fn token_expiry_is_exclusive() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let token = ConfirmationToken::issue("T1", issued, 30).unwrap();
        assert!(token.is_valid_at(issued + Duration::seconds(29)));
        assert!(!token.is_valid_at(issued + Duration::seconds(30)));
        assert_eq!(token.seconds_remaining(issued + Duration::milliseconds(500)), 29);
        assert_eq!(token.seconds_remaining(issued + Duration::seconds(45)), 0);
    }

    #[test]
    fn unrepresentable_expiry_is_refused() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(ConfirmationToken::issue("T1", issued, 10_000_000_000_000).is_none());
        assert!(ConfirmationToken::issue("T1", issued, i64::MAX).is_none());
        assert!(ConfirmationToken::issue("T1", issued, i64::MIN).is_none());

        let long = ConfirmationToken::issue("T1", issued, 86_400 * 365 * 1000).unwrap();
        assert!(long.seconds_remaining(issued) > 0);
    }

    #[test]
    fn validation_report_reads_wire_shape() {
        let report: ValidationReport = serde_json::from_value(serde_json::json!({
            "ok": false,
            "errors": ["unknown prefix"],
            "warnings": [],
            "used_uris": {"classes": ["voc:Pfarrer-in"], "properties": []}
        }))
        .unwrap();
        assert!(!report.ok);
        assert_eq!(report.used_classes(), ["voc:Pfarrer-in".to_string()]);
        assert!(report.used_properties().is_empty());
    }

    #[test]
    fn explain_report_maps_line_count() {
        let report: ExplainReport = serde_json::from_value(serde_json::json!({
            "kind": "SELECT",
            "summary": "reads persons",
            "predicates": ["voc:vorname"],
            "lines": 4
        }))
        .unwrap();
        assert_eq!(report.line_count, 4);
    }
}
