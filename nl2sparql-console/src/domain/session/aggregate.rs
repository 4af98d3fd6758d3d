use super::events::{SessionEvent, SessionEventPayload, StatementOrigin};
use super::value_object::{ConfirmationToken, ExplainReport, Statement, ValidationReport};
use chrono::{DateTime, Utc};

/// One composition episode: the pending statement, its reports and at most
/// one confirmation token.
///
/// A held token was always issued for the statement currently held. Every
/// statement replacement clears the token in the same transition.
#[derive(Debug, Default)]
pub struct ConfirmationSession {
    statement: Statement,
    validation: Option<ValidationReport>,
    explain: Option<ExplainReport>,
    token: Option<ConfirmationToken>,
    revision: u64,
    edit_epoch: u64,
    sequence: u64,
}

/// Read-only copy handed to presentation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub statement: Statement,
    pub validation: Option<ValidationReport>,
    pub explain: Option<ExplainReport>,
    pub token: Option<ConfirmationToken>,
    pub revision: u64,
    pub edit_epoch: u64,
}

impl ConfirmationSession {
    pub fn new(statement: impl Into<Statement>) -> Self {
        Self {
            statement: statement.into(),
            ..Self::default()
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    pub fn explain(&self) -> Option<&ExplainReport> {
        self.explain.as_ref()
    }

    pub fn token(&self) -> Option<&ConfirmationToken> {
        self.token.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn edit_epoch(&self) -> u64 {
        self.edit_epoch
    }

    /// Replaces the statement and drops everything derived from the old one.
    /// Operator edits also advance the edit epoch.
    pub fn set_statement(
        &mut self,
        statement: impl Into<Statement>,
        origin: StatementOrigin,
    ) -> SessionEvent {
        self.statement = statement.into();
        self.validation = None;
        self.explain = None;
        let token_cleared = self.token.take().is_some();
        self.revision += 1;
        if origin.is_operator_edit() {
            self.edit_epoch += 1;
        }
        self.record(SessionEventPayload::StatementReplaced {
            origin,
            token_cleared,
        })
    }

    pub fn attach_validation(&mut self, report: ValidationReport) -> SessionEvent {
        let ok = report.ok;
        self.validation = Some(report);
        self.record(SessionEventPayload::ValidationAttached { ok })
    }

    pub fn attach_explain(&mut self, report: ExplainReport) -> SessionEvent {
        self.explain = Some(report);
        self.record(SessionEventPayload::ExplainAttached)
    }

    /// Stores `token`, orphaning any previously held one.
    pub fn issue_token(&mut self, token: ConfirmationToken) -> SessionEvent {
        let expires_at = token.expires_at();
        let replaced = self.token.replace(token).is_some();
        self.record(SessionEventPayload::TokenIssued {
            expires_at,
            replaced,
        })
    }

    pub fn clear_token(&mut self) -> Option<SessionEvent> {
        self.token.take()?;
        Some(self.record(SessionEventPayload::TokenCleared))
    }

    /// Clears the held token only when it carries `value`.
    pub fn clear_token_if(&mut self, value: &str) -> Option<SessionEvent> {
        match &self.token {
            Some(token) if token.value() == value => self.clear_token(),
            _ => None,
        }
    }

    /// Generation result: statement, reports and token in one transition.
    /// Does not count as an operator edit.
    pub fn apply_generated(
        &mut self,
        statement: impl Into<Statement>,
        validation: Option<ValidationReport>,
        explain: Option<ExplainReport>,
        token: ConfirmationToken,
    ) -> Vec<SessionEvent> {
        let mut events = vec![self.set_statement(statement, StatementOrigin::Generated)];
        if let Some(report) = validation {
            events.push(self.attach_validation(report));
        }
        if let Some(report) = explain {
            events.push(self.attach_explain(report));
        }
        events.push(self.issue_token(token));
        events
    }

    pub fn is_executable(&self, now: DateTime<Utc>) -> bool {
        self.token
            .as_ref()
            .map(|token| token.is_valid_at(now))
            .unwrap_or(false)
    }

    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.token
            .as_ref()
            .map(|token| token.seconds_remaining(now))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            statement: self.statement.clone(),
            validation: self.validation.clone(),
            explain: self.explain.clone(),
            token: self.token.clone(),
            revision: self.revision,
            edit_epoch: self.edit_epoch,
        }
    }

    fn record(&mut self, payload: SessionEventPayload) -> SessionEvent {
        self.sequence += 1;
        SessionEvent::new(self.sequence, self.revision, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    const PERSON_QUERY: &str = "SELECT ?p WHERE {?p a voc:Pfarrer-in} LIMIT 1";

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn previewed(ttl: i64) -> ConfirmationSession {
        let mut session = ConfirmationSession::new(PERSON_QUERY);
        session.attach_validation(ValidationReport {
            ok: true,
            ..ValidationReport::default()
        });
        session.issue_token(ConfirmationToken::issue("T1", epoch(), ttl).unwrap());
        session
    }

    #[test]
    fn edit_clears_token_in_same_transition() {
        let mut session = previewed(60);
        assert!(session.is_executable(epoch()));

        let event = session.set_statement(
            "SELECT ?p WHERE {?p a voc:Pfarrer-in} LIMIT 2",
            StatementOrigin::Edit,
        );

        assert_eq!(
            event.payload,
            SessionEventPayload::StatementReplaced {
                origin: StatementOrigin::Edit,
                token_cleared: true,
            }
        );
        assert!(session.token().is_none());
        assert!(session.validation().is_none());
        assert!(!session.is_executable(epoch()));
    }

    #[test]
    fn executable_flips_exactly_at_expiry() {
        let session = previewed(60);
        assert!(session.is_executable(epoch() + Duration::milliseconds(59_999)));
        assert!(!session.is_executable(epoch() + Duration::seconds(60)));
        assert!(!ConfirmationSession::default().is_executable(epoch()));
    }

    #[test]
    fn generated_statement_does_not_advance_edit_epoch() {
        let mut session = ConfirmationSession::default();
        session.set_statement("ASK {}", StatementOrigin::Template);
        assert_eq!((session.revision(), session.edit_epoch()), (1, 1));

        let events = session.apply_generated(
            PERSON_QUERY,
            Some(ValidationReport::default()),
            None,
            ConfirmationToken::issue("G1", epoch(), 30).unwrap(),
        );

        assert_eq!(events.len(), 3);
        assert_eq!(events.last().map(SessionEvent::kind), Some("token_issued"));
        assert_eq!((session.revision(), session.edit_epoch()), (2, 1));
        assert_eq!(session.statement().as_str(), PERSON_QUERY);
        assert!(session.is_executable(epoch()));
    }

    #[test]
    fn clear_token_if_ignores_other_tokens() {
        let mut session = previewed(60);
        session.issue_token(ConfirmationToken::issue("T2", epoch(), 60).unwrap());

        assert!(session.clear_token_if("T1").is_none());
        assert_eq!(session.token().map(ConfirmationToken::value), Some("T2"));
        assert!(session.clear_token_if("T2").is_some());
        assert!(session.clear_token().is_none());
    }

    #[test]
    fn sequence_increases_per_transition() {
        let mut session = ConfirmationSession::default();
        let first = session.set_statement("ASK {}", StatementOrigin::Edit);
        let second = session.attach_explain(ExplainReport::default());
        assert!(second.sequence > first.sequence);
    }

    proptest! {
        #[test]
        fn seconds_remaining_is_never_negative(ttl in -120i64..3600, offset_ms in 0i64..10_000_000) {
            let session = previewed(ttl);
            let remaining = session.seconds_remaining(epoch() + Duration::milliseconds(offset_ms));
            prop_assert!(remaining >= 0);
            prop_assert!(remaining <= ttl.max(0));
        }

        #[test]
        fn any_edit_leaves_nothing_executable(text in "[ -~]{0,64}", offset_ms in 0i64..60_000) {
            let mut session = previewed(60);
            session.set_statement(text, StatementOrigin::Edit);
            prop_assert!(!session.is_executable(epoch() + Duration::milliseconds(offset_ms)));
        }
    }
}
