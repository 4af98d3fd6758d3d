use crate::domain::activity::{LogRecord, PerfSnapshot};
use crate::domain::knowledge::{OntologyTerms, SelectResults};
use crate::domain::session::{ExplainReport, ValidationReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{endpoint} unreachable: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: u16,
        message: String,
    },
    #[error("{endpoint} refused: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },
    #[error("{endpoint} sent an unreadable response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

impl RemoteError {
    /// Most specific human-readable reason, without the endpoint prefix.
    pub fn message(&self) -> &str {
        match self {
            RemoteError::Transport { message, .. }
            | RemoteError::Status { message, .. }
            | RemoteError::Rejected { message, .. }
            | RemoteError::Decode { message, .. } => message,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            RemoteError::Transport { endpoint, .. }
            | RemoteError::Status { endpoint, .. }
            | RemoteError::Rejected { endpoint, .. }
            | RemoteError::Decode { endpoint, .. } => endpoint,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub ok: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default = "default_true")]
    pub ok: bool,
    #[serde(default)]
    pub model: Option<String>,
    pub sparql: String,
    #[serde(default)]
    pub validation: Option<ValidationReport>,
    #[serde(default)]
    pub explain: Option<ExplainReport>,
    pub confirm_token: String,
    pub ttl_seconds: i64,
    #[serde(default)]
    pub attempts: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub validation: Option<ValidationReport>,
    #[serde(default)]
    pub explain: Option<ExplainReport>,
    pub confirm_token: String,
    pub ttl_seconds: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub undo_sparql: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectResponse {
    pub ok: bool,
    #[serde(default)]
    pub results: Option<SelectResults>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Compensating update request: either the bare undo statement or the full
/// record exactly as the log endpoint returned it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UndoRequest {
    Statement { undo_sparql: String },
    Record { log_record: LogRecord },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentLogs {
    #[serde(default)]
    pub items: Vec<LogRecord>,
}

fn default_true() -> bool {
    true
}

/// Request/response boundary to the NL2SPARQL backend. Stateless.
#[async_trait]
pub trait RemoteServicePort: Send + Sync {
    async fn health(&self) -> RemoteResult<HealthStatus>;
    async fn ontology_terms(&self) -> RemoteResult<OntologyTerms>;
    async fn generate(&self, request: GenerateRequest) -> RemoteResult<GenerateResponse>;
    async fn validate(&self, sparql: &str) -> RemoteResult<ValidationReport>;
    async fn explain(&self, sparql: &str) -> RemoteResult<ExplainReport>;
    async fn preview(&self, sparql: &str) -> RemoteResult<PreviewResponse>;
    async fn execute(&self, confirm_token: &str) -> RemoteResult<ExecuteResponse>;
    async fn run_select(&self, sparql: &str) -> RemoteResult<SelectResponse>;
    async fn undo(&self, request: UndoRequest) -> RemoteResult<UndoResponse>;
    async fn recent_logs(&self, limit: usize) -> RemoteResult<RecentLogs>;
    async fn perf(&self, window_minutes: u32) -> RemoteResult<PerfSnapshot>;
    async fn kps_sample(&self) -> RemoteResult<SelectResults>;
}
