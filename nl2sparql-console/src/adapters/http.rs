use crate::config::BackendConfig;
use crate::domain::activity::PerfSnapshot;
use crate::domain::knowledge::{OntologyTerms, SelectResults};
use crate::domain::session::{ExplainReport, ValidationReport};
use crate::ports::remote_port::{
    ExecuteResponse, GenerateRequest, GenerateResponse, HealthStatus, PreviewResponse,
    RecentLogs, RemoteError, RemoteResult, RemoteServicePort, SelectResponse, UndoRequest,
    UndoResponse,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const API_KEY_HEADER: &str = "x-api-key";

/// reqwest-backed client for the NL2SPARQL backend. Base address and key are
/// read from the shared config on every request.
pub struct HttpRemoteService {
    client: Client,
    config: Arc<BackendConfig>,
}

impl HttpRemoteService {
    pub fn new(config: Arc<BackendConfig>) -> anyhow::Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: Arc<BackendConfig>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.base_url();
        let base = base.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}{}", base, path)
        } else {
            format!("http://{}{}", base, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(key) = self.config.api_key() {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &'static str, path: &str) -> RemoteResult<T> {
        self.send(endpoint, self.request(Method::GET, path)).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        body: &Value,
    ) -> RemoteResult<T> {
        self.send(endpoint, self.request(Method::POST, path).json(body))
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> RemoteResult<T> {
        let response = builder.send().await.map_err(|err| RemoteError::Transport {
            endpoint,
            message: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_detail(&body).unwrap_or_else(|| status.to_string());
            debug!(endpoint, status = status.as_u16(), %message, "backend returned error status");
            return Err(RemoteError::Status {
                endpoint,
                status: status.as_u16(),
                message,
            });
        }
        response.json::<T>().await.map_err(|err| RemoteError::Decode {
            endpoint,
            message: err.to_string(),
        })
    }
}

/// Pulls `detail` or `message` out of an error body. Structured details are
/// rendered as compact JSON.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
}

#[async_trait]
impl RemoteServicePort for HttpRemoteService {
    async fn health(&self) -> RemoteResult<HealthStatus> {
        self.get("health", "/health").await
    }

    async fn ontology_terms(&self) -> RemoteResult<OntologyTerms> {
        self.get("ontology_terms", "/ontology/terms").await
    }

    async fn generate(&self, request: GenerateRequest) -> RemoteResult<GenerateResponse> {
        let body = json!({ "text": request.text, "intent": request.intent });
        self.post("generate", "/nl2sparql/generate", &body).await
    }

    async fn validate(&self, sparql: &str) -> RemoteResult<ValidationReport> {
        self.post("validate", "/nl2sparql/validate", &json!({ "sparql": sparql }))
            .await
    }

    async fn explain(&self, sparql: &str) -> RemoteResult<ExplainReport> {
        self.post("explain", "/nl2sparql/explain", &json!({ "sparql": sparql }))
            .await
    }

    async fn preview(&self, sparql: &str) -> RemoteResult<PreviewResponse> {
        self.post("preview", "/nl2sparql/preview", &json!({ "sparql": sparql }))
            .await
    }

    async fn execute(&self, confirm_token: &str) -> RemoteResult<ExecuteResponse> {
        let body = json!({ "confirm_token": confirm_token });
        self.post("execute", "/nl2sparql/execute", &body).await
    }

    async fn run_select(&self, sparql: &str) -> RemoteResult<SelectResponse> {
        self.post("select", "/nl2sparql/select", &json!({ "sparql": sparql }))
            .await
    }

    async fn undo(&self, request: UndoRequest) -> RemoteResult<UndoResponse> {
        let body = serde_json::to_value(&request).map_err(|err| RemoteError::Decode {
            endpoint: "undo",
            message: err.to_string(),
        })?;
        self.post("undo", "/nl2sparql/undo", &body).await
    }

    async fn recent_logs(&self, limit: usize) -> RemoteResult<RecentLogs> {
        self.get("recent_logs", &format!("/logs/recent?limit={}", limit))
            .await
    }

    async fn perf(&self, window_minutes: u32) -> RemoteResult<PerfSnapshot> {
        self.get("perf", &format!("/metrics/perf?minutes={}", window_minutes))
            .await
    }

    async fn kps_sample(&self) -> RemoteResult<SelectResults> {
        self.get("kps_sample", "/kps/sample").await
    }
}
