use crate::domain::activity::{LogRecord, LogStatus, PerfSnapshot};
use crate::domain::knowledge::{OntologyTerms, SelectResults};
use crate::domain::session::{ExplainReport, ValidationReport};
use crate::ports::prompt_port::{ConfirmRequest, ConfirmationPrompt};
use crate::ports::remote_port::{
    ExecuteResponse, GenerateRequest, GenerateResponse, HealthStatus, PreviewResponse,
    RecentLogs, RemoteError, RemoteResult, RemoteServicePort, SelectResponse, UndoRequest,
    UndoResponse,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

pub(crate) const PERSON_QUERY: &str = "SELECT ?p WHERE {?p a voc:Pfarrer-in} LIMIT 1";
pub(crate) const INSERT_QUERY: &str =
    "INSERT DATA { <urn:example:person:NEW> <urn:example:name> \"Anna\" }";

pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

enum Reply<T> {
    Ready(RemoteResult<T>),
    Gated(oneshot::Receiver<RemoteResult<T>>),
}

/// Scripted replies for one endpoint. Queued replies are consumed in order;
/// once the queue is empty the repeat reply (if any) is returned.
pub(crate) struct Script<T> {
    endpoint: &'static str,
    queue: Mutex<VecDeque<Reply<T>>>,
    repeat: Mutex<Option<RemoteResult<T>>>,
}

impl<T: Clone> Script<T> {
    fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            queue: Mutex::new(VecDeque::new()),
            repeat: Mutex::new(None),
        }
    }

    pub(crate) fn push(&self, reply: RemoteResult<T>) {
        self.queue.lock().push_back(Reply::Ready(reply));
    }

    /// Reply held back until the returned sender fires.
    pub(crate) fn push_gated(&self) -> oneshot::Sender<RemoteResult<T>> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub(crate) fn repeat(&self, reply: RemoteResult<T>) {
        *self.repeat.lock() = Some(reply);
    }

    async fn next(&self) -> RemoteResult<T> {
        let reply = self.queue.lock().pop_front();
        let gate = match reply {
            Some(Reply::Ready(result)) => return result,
            Some(Reply::Gated(rx)) => rx,
            None => {
                let repeat = self.repeat.lock().clone();
                return repeat.unwrap_or_else(|| {
                    Err(RemoteError::Transport {
                        endpoint: self.endpoint,
                        message: "no scripted reply".into(),
                    })
                });
            }
        };
        gate.await.unwrap_or_else(|_| {
            Err(RemoteError::Transport {
                endpoint: self.endpoint,
                message: "gate dropped".into(),
            })
        })
    }
}

pub(crate) struct FakeRemote {
    calls: Mutex<Vec<(&'static str, String)>>,
    pub(crate) health: Script<HealthStatus>,
    pub(crate) terms: Script<OntologyTerms>,
    pub(crate) generate: Script<GenerateResponse>,
    pub(crate) validate: Script<ValidationReport>,
    pub(crate) explain: Script<ExplainReport>,
    pub(crate) preview: Script<PreviewResponse>,
    pub(crate) execute: Script<ExecuteResponse>,
    pub(crate) select: Script<SelectResponse>,
    pub(crate) undo: Script<UndoResponse>,
    pub(crate) logs: Script<RecentLogs>,
    pub(crate) perf: Script<PerfSnapshot>,
    pub(crate) kps: Script<SelectResults>,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            health: Script::new("health"),
            terms: Script::new("ontology_terms"),
            generate: Script::new("generate"),
            validate: Script::new("validate"),
            explain: Script::new("explain"),
            preview: Script::new("preview"),
            execute: Script::new("execute"),
            select: Script::new("select"),
            undo: Script::new("undo"),
            logs: Script::new("recent_logs"),
            perf: Script::new("perf"),
            kps: Script::new("kps_sample"),
        }
    }

    fn record(&self, endpoint: &'static str, argument: impl Into<String>) {
        self.calls.lock().push((endpoint, argument.into()));
    }

    pub(crate) fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .count()
    }

    pub(crate) fn arguments(&self, endpoint: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .map(|(_, argument)| argument.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteServicePort for FakeRemote {
    async fn health(&self) -> RemoteResult<HealthStatus> {
        self.record("health", "");
        self.health.next().await
    }

    async fn ontology_terms(&self) -> RemoteResult<OntologyTerms> {
        self.record("ontology_terms", "");
        self.terms.next().await
    }

    async fn generate(&self, request: GenerateRequest) -> RemoteResult<GenerateResponse> {
        self.record("generate", request.text);
        self.generate.next().await
    }

    async fn validate(&self, sparql: &str) -> RemoteResult<ValidationReport> {
        self.record("validate", sparql);
        self.validate.next().await
    }

    async fn explain(&self, sparql: &str) -> RemoteResult<ExplainReport> {
        self.record("explain", sparql);
        self.explain.next().await
    }

    async fn preview(&self, sparql: &str) -> RemoteResult<PreviewResponse> {
        self.record("preview", sparql);
        self.preview.next().await
    }

    async fn execute(&self, confirm_token: &str) -> RemoteResult<ExecuteResponse> {
        self.record("execute", confirm_token);
        self.execute.next().await
    }

    async fn run_select(&self, sparql: &str) -> RemoteResult<SelectResponse> {
        self.record("select", sparql);
        self.select.next().await
    }

    async fn undo(&self, request: UndoRequest) -> RemoteResult<UndoResponse> {
        let body = serde_json::to_string(&request).unwrap_or_default();
        self.record("undo", body);
        self.undo.next().await
    }

    async fn recent_logs(&self, limit: usize) -> RemoteResult<RecentLogs> {
        self.record("recent_logs", limit.to_string());
        self.logs.next().await
    }

    async fn perf(&self, window_minutes: u32) -> RemoteResult<PerfSnapshot> {
        self.record("perf", window_minutes.to_string());
        self.perf.next().await
    }

    async fn kps_sample(&self) -> RemoteResult<SelectResults> {
        self.record("kps_sample", "");
        self.kps.next().await
    }
}

pub(crate) struct CountingPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl CountingPrompt {
    pub(crate) fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub(crate) fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmationPrompt for CountingPrompt {
    async fn confirm(&self, _request: &ConfirmRequest) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

pub(crate) fn server_error(endpoint: &'static str) -> RemoteError {
    RemoteError::Status {
        endpoint,
        status: 500,
        message: "backend exploded".into(),
    }
}

pub(crate) fn preview_ok(token: &str, ttl_seconds: i64) -> PreviewResponse {
    PreviewResponse {
        validation: Some(ValidationReport {
            ok: true,
            ..ValidationReport::default()
        }),
        explain: Some(ExplainReport {
            kind: "SELECT".into(),
            summary: "reads persons".into(),
            predicates: vec![],
            line_count: 1,
        }),
        confirm_token: token.into(),
        ttl_seconds,
    }
}

pub(crate) fn generate_ok(sparql: &str, token: &str, ttl_seconds: i64) -> GenerateResponse {
    GenerateResponse {
        ok: true,
        model: Some("test-model".into()),
        sparql: sparql.into(),
        validation: Some(ValidationReport {
            ok: true,
            ..ValidationReport::default()
        }),
        explain: None,
        confirm_token: token.into(),
        ttl_seconds,
        attempts: Some(1),
    }
}

pub(crate) fn log_record(status: LogStatus, undo: Option<&str>) -> LogRecord {
    serde_json::from_value(serde_json::json!({
        "ts": "2024-05-01T12:00:05Z",
        "status": status.slug(),
        "sparql": INSERT_QUERY,
        "undo_sparql": undo,
    }))
    .expect("log record fixture")
}

/// Polls `condition` until it holds or two seconds pass.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
