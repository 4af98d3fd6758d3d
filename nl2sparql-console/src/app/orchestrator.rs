use super::countdown::CountdownTimer;
use super::error::{ConsoleError, ConsoleResult, Precondition};
use super::model::{ActionKind, ExecuteOutcome, GenerateOutcome, PreviewOutcome, UndoOutcome};
use super::notices::{Notice, NoticeBoard, NoticeKind};
use super::polling::PollHandle;
use super::templates::{self, Template, TemplateKind, DEFAULT_NL_TEXT, DEFAULT_STATEMENT};
use super::view::{ConsoleViewModel, TokenView};
use crate::config::{ConsoleSettings, TokenFailurePolicy};
use crate::domain::activity::LogRecord;
use crate::domain::knowledge::{OntologyTerms, SelectResults};
use crate::domain::session::{
    ConfirmationSession, ConfirmationToken, ExplainReport, SessionEvent, SessionEventPayload,
    SessionSnapshot, Statement, StatementOrigin, ValidationReport,
};
use crate::ports::clock_port::Clock;
use crate::ports::prompt_port::{ConfirmRequest, ConfirmSubject, ConfirmationPrompt};
use crate::ports::remote_port::{GenerateRequest, RemoteError, RemoteServicePort, UndoRequest};
use crate::telemetry::{self, outcome};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Workspace {
    nl_text: String,
    last_generated: Option<Statement>,
    select: Option<SelectResults>,
    terms: Option<OntologyTerms>,
    backend_reachable: Option<bool>,
}

/// Decrements the in-flight count for its action when dropped.
struct InFlight<'a> {
    counts: &'a Mutex<BTreeMap<ActionKind, usize>>,
    action: ActionKind,
    started: Instant,
}

impl InFlight<'_> {
    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut counts = self.counts.lock();
        if let Some(count) = counts.get_mut(&self.action) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&self.action);
            }
        }
    }
}

/// Sequences remote calls against the confirmation session.
///
/// Overlapping actions are allowed. Responses are applied only while the
/// session still matches what the call was issued for: statement-bound
/// actions compare the session revision, generate compares the operator
/// edit epoch, and execute clears only the exact token it spent.
pub struct ActionOrchestrator {
    remote: Arc<dyn RemoteServicePort>,
    prompt: Arc<dyn ConfirmationPrompt>,
    clock: Arc<dyn Clock>,
    failure_policy: TokenFailurePolicy,
    session: Mutex<ConfirmationSession>,
    workspace: Mutex<Workspace>,
    notices: NoticeBoard,
    countdown: CountdownTimer,
    in_flight: Mutex<BTreeMap<ActionKind, usize>>,
    log_refresh: Mutex<Option<PollHandle>>,
}

impl ActionOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteServicePort>,
        prompt: Arc<dyn ConfirmationPrompt>,
        clock: Arc<dyn Clock>,
        settings: &ConsoleSettings,
    ) -> Self {
        Self {
            remote,
            prompt,
            clock,
            failure_policy: settings.failure_policy,
            session: Mutex::new(ConfirmationSession::new(DEFAULT_STATEMENT)),
            workspace: Mutex::new(Workspace {
                nl_text: DEFAULT_NL_TEXT.to_string(),
                last_generated: None,
                select: None,
                terms: None,
                backend_reachable: None,
            }),
            notices: NoticeBoard::new(settings.notice_ttl),
            countdown: CountdownTimer::new(),
            in_flight: Mutex::new(BTreeMap::new()),
            log_refresh: Mutex::new(None),
        }
    }

    /// Log worker to nudge after execute and undo.
    pub fn attach_log_refresh(&self, handle: PollHandle) {
        *self.log_refresh.lock() = Some(handle);
    }

    pub fn failure_policy(&self) -> TokenFailurePolicy {
        self.failure_policy
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    pub fn statement(&self) -> Statement {
        self.session.lock().statement().clone()
    }

    pub fn nl_text(&self) -> String {
        self.workspace.lock().nl_text.clone()
    }

    pub fn select_results(&self) -> Option<SelectResults> {
        self.workspace.lock().select.clone()
    }

    pub fn ontology_terms(&self) -> Option<OntologyTerms> {
        self.workspace.lock().terms.clone()
    }

    pub fn is_executable(&self) -> bool {
        self.session.lock().is_executable(self.clock.now())
    }

    pub fn seconds_remaining(&self) -> i64 {
        self.session.lock().seconds_remaining(self.clock.now())
    }

    /// Remaining seconds of the held token, published once per second.
    pub fn countdown(&self) -> watch::Receiver<Option<i64>> {
        self.countdown.subscribe()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notices.current(self.clock.now())
    }

    pub fn is_busy(&self, action: ActionKind) -> bool {
        self.in_flight.lock().contains_key(&action)
    }

    pub fn busy_actions(&self) -> Vec<ActionKind> {
        self.in_flight.lock().keys().copied().collect()
    }

    pub fn set_nl_text(&self, text: impl Into<String>) {
        self.workspace.lock().nl_text = text.into();
    }

    /// Operator edit of the statement; drops any held token.
    pub fn edit_statement(&self, text: impl Into<Statement>) -> SessionEvent {
        self.replace_statement(text.into(), StatementOrigin::Edit)
    }

    pub fn apply_template(&self, index: usize) -> ConsoleResult<&'static Template> {
        let Some(template) = templates::template(index) else {
            let precondition = Precondition::UnknownTemplate(index);
            self.notices
                .show(precondition.notice_kind(), precondition.to_string(), self.clock.now());
            return Err(ConsoleError::LocalPrecondition(precondition));
        };
        match template.kind {
            TemplateKind::NaturalLanguage => self.set_nl_text(template.text),
            TemplateKind::Select | TemplateKind::Insert => {
                self.replace_statement(Statement::from(template.text), StatementOrigin::Template);
            }
        }
        self.notices.show(
            NoticeKind::Info,
            format!("Template loaded: {}", template.label),
            self.clock.now(),
        );
        Ok(template)
    }

    pub async fn ping(&self) -> ConsoleResult<bool> {
        let action = ActionKind::Ping;
        let flight = self.begin(action);
        match self.remote.health().await {
            Ok(health) => {
                self.workspace.lock().backend_reachable = Some(health.ok);
                let kind = if health.ok {
                    NoticeKind::Success
                } else {
                    NoticeKind::Error
                };
                let text = if health.ok {
                    "Backend reachable"
                } else {
                    "Backend reports unhealthy"
                };
                self.succeed(action, &flight, kind, text);
                Ok(health.ok)
            }
            Err(err) => {
                self.workspace.lock().backend_reachable = Some(false);
                self.remote_failure(action, &flight, err, false)
            }
        }
    }

    pub async fn load_terms(&self) -> ConsoleResult<OntologyTerms> {
        let action = ActionKind::LoadTerms;
        let flight = self.begin(action);
        match self.remote.ontology_terms().await {
            Ok(terms) => {
                self.workspace.lock().terms = Some(terms.clone());
                telemetry::record_action(action.as_str(), outcome::SUCCESS, Some(flight.elapsed_ms()));
                debug!(
                    classes = terms.classes.len(),
                    properties = terms.properties.len(),
                    "ontology terms loaded"
                );
                Ok(terms)
            }
            Err(err) => {
                self.workspace.lock().terms = None;
                self.remote_failure(action, &flight, err, false)
            }
        }
    }

    /// Turns the current natural-language text into a statement with reports
    /// and a fresh token.
    pub async fn generate(&self, intent: Option<String>) -> ConsoleResult<GenerateOutcome> {
        let action = ActionKind::Generate;
        let text = self.workspace.lock().nl_text.trim().to_string();
        if text.is_empty() {
            return self.reject(action, Precondition::EmptyRequest);
        }
        let epoch = self.session.lock().edit_epoch();
        let flight = self.begin(action);
        let result = self.remote.generate(GenerateRequest { text, intent }).await;

        let response = match result {
            Ok(response) if response.ok => response,
            Ok(_) => {
                let err = RemoteError::Rejected {
                    endpoint: "generate",
                    message: "generation reported failure".into(),
                };
                return self.generate_failure(epoch, &flight, err);
            }
            Err(err) => return self.generate_failure(epoch, &flight, err),
        };

        let token =
            match self.token_from("generate", response.confirm_token, response.ttl_seconds) {
                Ok(token) => token,
                Err(err) => return self.generate_failure(epoch, &flight, err),
            };
        let expires_at = token.expires_at();
        let statement = Statement::new(response.sparql);
        let events = {
            let mut session = self.session.lock();
            if session.edit_epoch() != epoch {
                None
            } else {
                let events = session.apply_generated(
                    statement.clone(),
                    response.validation,
                    response.explain,
                    token,
                );
                self.countdown.start(expires_at, Arc::clone(&self.clock));
                Some(events)
            }
        };
        let Some(events) = events else {
            return self.discard(action, &flight);
        };

        {
            let mut workspace = self.workspace.lock();
            workspace.last_generated = Some(statement.clone());
            workspace.select = None;
        }
        let model = response.model.clone().unwrap_or_else(|| "unknown model".into());
        info!(action = action.as_str(), %model, ttl = response.ttl_seconds, "statement generated");
        self.succeed(
            action,
            &flight,
            NoticeKind::Success,
            format!("Generate ok ({}), token ready.", model),
        );
        Ok(GenerateOutcome {
            statement,
            model: response.model,
            attempts: response.attempts,
            expires_at,
            events,
        })
    }

    pub async fn validate(&self) -> ConsoleResult<ValidationReport> {
        let action = ActionKind::Validate;
        let (statement, revision) = self.current_statement(action)?;
        let flight = self.begin(action);
        let result = self.remote.validate(statement.as_str()).await;

        let report = match result {
            Ok(report) => report,
            Err(err) => return self.statement_failure(action, revision, &flight, err, false),
        };
        if !self.with_revision(revision, |session| {
            session.attach_validation(report.clone());
        }) {
            return self.discard(action, &flight);
        }
        let (kind, text) = if report.ok {
            (NoticeKind::Success, "Validate ok".to_string())
        } else {
            (
                NoticeKind::Info,
                format!("Validation found {} error(s)", report.errors.len()),
            )
        };
        self.succeed(action, &flight, kind, text);
        Ok(report)
    }

    pub async fn explain(&self) -> ConsoleResult<ExplainReport> {
        let action = ActionKind::Explain;
        let (statement, revision) = self.current_statement(action)?;
        let flight = self.begin(action);
        let result = self.remote.explain(statement.as_str()).await;

        let report = match result {
            Ok(report) => report,
            Err(err) => return self.statement_failure(action, revision, &flight, err, false),
        };
        if !self.with_revision(revision, |session| {
            session.attach_explain(report.clone());
        }) {
            return self.discard(action, &flight);
        }
        self.succeed(action, &flight, NoticeKind::Success, "Explain ok");
        Ok(report)
    }

    /// Validates and explains the current statement and issues a new token.
    pub async fn preview(&self) -> ConsoleResult<PreviewOutcome> {
        let action = ActionKind::Preview;
        let (statement, revision) = self.current_statement(action)?;
        let flight = self.begin(action);
        let result = self.remote.preview(statement.as_str()).await;

        let response = match result {
            Ok(response) => response,
            Err(err) => return self.statement_failure(action, revision, &flight, err, true),
        };
        let validation_ok = response.validation.as_ref().map(|report| report.ok);
        let token =
            match self.token_from("preview", response.confirm_token, response.ttl_seconds) {
                Ok(token) => token,
                Err(err) => return self.statement_failure(action, revision, &flight, err, true),
            };
        let expires_at = token.expires_at();
        let mut events = Vec::new();
        let applied = self.with_revision(revision, |session| {
            if let Some(report) = response.validation {
                events.push(session.attach_validation(report));
            }
            if let Some(report) = response.explain {
                events.push(session.attach_explain(report));
            }
            events.push(session.issue_token(token));
            self.countdown.start(expires_at, Arc::clone(&self.clock));
        });
        if !applied {
            return self.discard(action, &flight);
        }
        self.succeed(action, &flight, NoticeKind::Success, "Preview ok, token ready.");
        Ok(PreviewOutcome {
            expires_at,
            validation_ok,
            events,
        })
    }

    /// Spends the held token after operator confirmation.
    pub async fn execute(&self) -> ConsoleResult<ExecuteOutcome> {
        let action = ActionKind::Execute;
        let Some((token, statement)) = self.executable_token() else {
            return self.reject(action, Precondition::NoValidToken);
        };
        let request = ConfirmRequest {
            subject: ConfirmSubject::Execute {
                seconds_remaining: token.seconds_remaining(self.clock.now()),
            },
            statement: statement.to_string(),
        };
        if !self.prompt.confirm(&request).await {
            return self.decline(action);
        }
        // The prompt may have taken long enough for the token to lapse or be replaced.
        match self.executable_token() {
            Some((current, _)) if current.value() == token.value() => {}
            _ => return self.reject(action, Precondition::NoValidToken),
        }

        let flight = self.begin(action);
        let result = self.remote.execute(token.value()).await;
        let token_cleared = self.clear_token_if(token.value());

        let response = match result {
            Ok(response) if response.ok => response,
            Ok(response) => {
                let err = RemoteError::Rejected {
                    endpoint: "execute",
                    message: response
                        .message
                        .unwrap_or_else(|| "execute reported failure".into()),
                };
                return self.remote_failure(action, &flight, err, false);
            }
            Err(err) => return self.remote_failure(action, &flight, err, false),
        };

        let message = response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Execute ok".into());
        info!(action = action.as_str(), token_cleared, "update executed");
        self.succeed(action, &flight, NoticeKind::Success, message.clone());
        self.request_log_refresh("execute");
        Ok(ExecuteOutcome {
            message,
            undo_statement: response.undo_sparql,
            token_cleared,
        })
    }

    /// Runs the current statement on the read-only endpoint.
    pub async fn run_select(&self) -> ConsoleResult<SelectResults> {
        let action = ActionKind::RunSelect;
        let (statement, revision) = {
            let session = self.session.lock();
            (session.statement().clone(), session.revision())
        };
        if !statement.is_read_query() {
            return self.reject(action, Precondition::NotASelect);
        }
        let flight = self.begin(action);
        let result = self.remote.run_select(statement.as_str()).await;

        let results = match result {
            Ok(response) if response.ok => response.results.unwrap_or_default(),
            Ok(response) => {
                let err = RemoteError::Rejected {
                    endpoint: "select",
                    message: response.message.unwrap_or_else(|| "ok=false".into()),
                };
                return self.select_failure(revision, &flight, err);
            }
            Err(err) => return self.select_failure(revision, &flight, err),
        };
        if self.session.lock().revision() != revision {
            return self.discard(action, &flight);
        }
        self.workspace.lock().select = Some(results.clone());
        self.succeed(
            action,
            &flight,
            NoticeKind::Success,
            format!("SELECT returned {} row(s).", results.row_count()),
        );
        Ok(results)
    }

    /// Loads the KPS sample query as an edit, then fetches its results.
    pub async fn run_kps_sample(&self) -> ConsoleResult<SelectResults> {
        let action = ActionKind::KpsSample;
        self.replace_statement(
            Statement::from(templates::KPS_SAMPLE_QUERY),
            StatementOrigin::KpsSample,
        );
        let revision = self.session.lock().revision();
        let flight = self.begin(action);
        let result = self.remote.kps_sample().await;
        if self.session.lock().revision() != revision {
            return self.discard(action, &flight);
        }
        match result {
            Ok(results) => {
                self.workspace.lock().select = Some(results.clone());
                self.succeed(
                    action,
                    &flight,
                    NoticeKind::Success,
                    format!("KPS sample loaded ({} row(s)).", results.row_count()),
                );
                Ok(results)
            }
            Err(err) => {
                self.workspace.lock().select = None;
                self.remote_failure(action, &flight, err, false)
            }
        }
    }

    /// Asks the backend to compensate an applied update.
    pub async fn undo(&self, record: &LogRecord) -> ConsoleResult<UndoOutcome> {
        let action = ActionKind::Undo;
        if !record.can_undo() {
            return self.reject(action, Precondition::UndoUnavailable);
        }
        let request = ConfirmRequest {
            subject: ConfirmSubject::Undo {
                recorded_at: record.timestamp.clone(),
            },
            statement: record.undo_statement.clone().unwrap_or_default(),
        };
        if !self.prompt.confirm(&request).await {
            return self.decline(action);
        }

        let flight = self.begin(action);
        let result = self
            .remote
            .undo(UndoRequest::Record {
                log_record: record.clone(),
            })
            .await;
        let response = match result {
            Ok(response) if response.ok => response,
            Ok(response) => {
                let err = RemoteError::Rejected {
                    endpoint: "undo",
                    message: response
                        .message
                        .unwrap_or_else(|| "undo reported failure".into()),
                };
                return self.remote_failure(action, &flight, err, false);
            }
            Err(err) => return self.remote_failure(action, &flight, err, false),
        };
        let message = response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Undo applied".into());
        self.succeed(action, &flight, NoticeKind::Success, message.clone());
        self.request_log_refresh("undo");
        Ok(UndoOutcome { message })
    }

    /// Read-only view of everything the orchestrator owns. Activity feeds
    /// are filled in by [`ConsoleViewModel::with_activity`].
    pub fn view(&self) -> ConsoleViewModel {
        let now = self.clock.now();
        let snapshot = self.session.lock().snapshot();
        let workspace = self.workspace.lock().clone();
        let token = snapshot.token.as_ref().map(|token| TokenView {
            expires_at: token.expires_at(),
            seconds_remaining: token.seconds_remaining(now),
            executable: token.is_valid_at(now),
        });
        ConsoleViewModel {
            nl_text: workspace.nl_text,
            last_generated: workspace.last_generated,
            statement: snapshot.statement,
            validation: snapshot.validation,
            explain: snapshot.explain,
            token,
            select: workspace.select,
            terms: workspace.terms,
            backend_reachable: workspace.backend_reachable,
            notice: self.notices.current(now),
            busy: self.busy_actions(),
            logs: Vec::new(),
            log_limit: None,
            perf: None,
            perf_window_minutes: None,
        }
    }

    pub fn shutdown(&self) {
        let _session = self.session.lock();
        self.countdown.stop();
        self.log_refresh.lock().take();
    }

    fn replace_statement(&self, statement: Statement, origin: StatementOrigin) -> SessionEvent {
        let event = {
            let mut session = self.session.lock();
            let event = session.set_statement(statement, origin);
            if let SessionEventPayload::StatementReplaced {
                token_cleared: true,
                ..
            } = event.payload
            {
                self.countdown.stop();
            }
            event
        };
        debug!(origin = origin.as_str(), revision = event.revision, "statement replaced");
        event
    }

    fn current_statement(&self, action: ActionKind) -> ConsoleResult<(Statement, u64)> {
        let (statement, revision) = {
            let session = self.session.lock();
            (session.statement().clone(), session.revision())
        };
        if statement.is_blank() {
            return self.reject(action, Precondition::EmptyStatement);
        }
        Ok((statement, revision))
    }

    /// Applies `update` only while the session revision is unchanged.
    fn with_revision(
        &self,
        revision: u64,
        update: impl FnOnce(&mut ConfirmationSession),
    ) -> bool {
        let mut session = self.session.lock();
        if session.revision() != revision {
            return false;
        }
        update(&mut session);
        true
    }

    fn executable_token(&self) -> Option<(ConfirmationToken, Statement)> {
        let now = self.clock.now();
        let session = self.session.lock();
        if !session.is_executable(now) {
            return None;
        }
        session
            .token()
            .cloned()
            .map(|token| (token, session.statement().clone()))
    }

    // The countdown is started and stopped only under the session lock so it
    // always follows the token the session holds.
    fn clear_token_if(&self, value: &str) -> bool {
        let mut session = self.session.lock();
        let cleared = session.clear_token_if(value).is_some();
        if cleared {
            self.countdown.stop();
        }
        cleared
    }

    fn clear_held_token(&self) {
        let mut session = self.session.lock();
        if session.clear_token().is_some() {
            self.countdown.stop();
        }
    }

    fn token_from(
        &self,
        endpoint: &'static str,
        value: String,
        ttl_seconds: i64,
    ) -> Result<ConfirmationToken, RemoteError> {
        ConfirmationToken::issue(value, self.clock.now(), ttl_seconds).ok_or_else(|| {
            RemoteError::Decode {
                endpoint,
                message: format!("ttl_seconds {} is out of range", ttl_seconds),
            }
        })
    }

    fn request_log_refresh(&self, reason: &'static str) {
        if let Some(handle) = self.log_refresh.lock().as_ref() {
            handle.notify_refresh(reason);
        }
    }

    fn begin(&self, action: ActionKind) -> InFlight<'_> {
        *self.in_flight.lock().entry(action).or_insert(0) += 1;
        InFlight {
            counts: &self.in_flight,
            action,
            started: Instant::now(),
        }
    }

    fn succeed(
        &self,
        action: ActionKind,
        flight: &InFlight<'_>,
        kind: NoticeKind,
        text: impl Into<String>,
    ) {
        self.notices.show(kind, text, self.clock.now());
        telemetry::record_action(action.as_str(), outcome::SUCCESS, Some(flight.elapsed_ms()));
    }

    fn reject<T>(&self, action: ActionKind, precondition: Precondition) -> ConsoleResult<T> {
        debug!(action = action.as_str(), %precondition, "action rejected locally");
        self.notices.show(
            precondition.notice_kind(),
            precondition.to_string(),
            self.clock.now(),
        );
        telemetry::record_action(action.as_str(), outcome::REJECTED, None);
        Err(ConsoleError::LocalPrecondition(precondition))
    }

    fn decline<T>(&self, action: ActionKind) -> ConsoleResult<T> {
        debug!(action = action.as_str(), "confirmation declined");
        self.notices.show(
            NoticeKind::Info,
            format!("{} cancelled", action.label()),
            self.clock.now(),
        );
        telemetry::record_action(action.as_str(), outcome::DECLINED, None);
        Err(ConsoleError::Declined { action })
    }

    /// Superseded responses leave no notice behind.
    fn discard<T>(&self, action: ActionKind, flight: &InFlight<'_>) -> ConsoleResult<T> {
        debug!(action = action.as_str(), "discarding stale response");
        telemetry::record_action(action.as_str(), outcome::STALE, Some(flight.elapsed_ms()));
        Err(ConsoleError::Stale { action })
    }

    fn remote_failure<T>(
        &self,
        action: ActionKind,
        flight: &InFlight<'_>,
        err: RemoteError,
        token_policy_applies: bool,
    ) -> ConsoleResult<T> {
        if token_policy_applies && self.failure_policy == TokenFailurePolicy::Clear {
            self.clear_held_token();
        }
        warn!(
            action = action.as_str(),
            endpoint = err.endpoint(),
            %err,
            "remote call failed"
        );
        self.notices.show(
            NoticeKind::Error,
            format!("{} failed: {}", action.label(), err.message()),
            self.clock.now(),
        );
        telemetry::record_action(
            action.as_str(),
            outcome::REMOTE_FAILURE,
            Some(flight.elapsed_ms()),
        );
        Err(ConsoleError::Remote(err))
    }

    fn generate_failure<T>(
        &self,
        epoch: u64,
        flight: &InFlight<'_>,
        err: RemoteError,
    ) -> ConsoleResult<T> {
        if self.session.lock().edit_epoch() != epoch {
            return self.discard(ActionKind::Generate, flight);
        }
        self.remote_failure(ActionKind::Generate, flight, err, true)
    }

    fn statement_failure<T>(
        &self,
        action: ActionKind,
        revision: u64,
        flight: &InFlight<'_>,
        err: RemoteError,
        token_policy_applies: bool,
    ) -> ConsoleResult<T> {
        if self.session.lock().revision() != revision {
            return self.discard(action, flight);
        }
        self.remote_failure(action, flight, err, token_policy_applies)
    }

    fn select_failure<T>(
        &self,
        revision: u64,
        flight: &InFlight<'_>,
        err: RemoteError,
    ) -> ConsoleResult<T> {
        if self.session.lock().revision() != revision {
            return self.discard(ActionKind::RunSelect, flight);
        }
        self.workspace.lock().select = None;
        self.remote_failure(ActionKind::RunSelect, flight, err, false)
    }
}

impl Drop for ActionOrchestrator {
    fn drop(&mut self) {
        self.countdown.stop();
    }
}
