use super::model::ActionKind;
use super::notices::Notice;
use super::polling::PollingLoops;
use crate::domain::activity::{LogRecord, PerfSnapshot};
use crate::domain::knowledge::{OntologyTerms, SelectResults};
use crate::domain::session::{ExplainReport, Statement, ValidationReport};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenView {
    pub expires_at: DateTime<Utc>,
    pub seconds_remaining: i64,
    pub executable: bool,
}

/// Everything a front end needs to draw the console, copied out of the
/// orchestrator and the polling loops at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsoleViewModel {
    pub nl_text: String,
    pub last_generated: Option<Statement>,
    pub statement: Statement,
    pub validation: Option<ValidationReport>,
    pub explain: Option<ExplainReport>,
    pub token: Option<TokenView>,
    pub select: Option<SelectResults>,
    pub terms: Option<OntologyTerms>,
    pub backend_reachable: Option<bool>,
    pub notice: Option<Notice>,
    pub busy: Vec<ActionKind>,
    pub logs: Vec<LogRecord>,
    pub log_limit: Option<usize>,
    pub perf: Option<PerfSnapshot>,
    pub perf_window_minutes: Option<u32>,
}

impl ConsoleViewModel {
    pub fn with_activity(mut self, polling: &PollingLoops) -> Self {
        self.logs = polling.logs().records();
        self.log_limit = Some(polling.logs().limit());
        self.perf = polling.perf().snapshot();
        self.perf_window_minutes = Some(polling.perf().window_minutes());
        self
    }

    pub fn can_execute(&self) -> bool {
        self.token
            .as_ref()
            .map(|token| token.executable)
            .unwrap_or(false)
    }

    pub fn can_run_select(&self) -> bool {
        self.statement.is_read_query()
    }

    /// Log rows offering an undo, with their position in `logs`.
    pub fn undoable_logs(&self) -> impl Iterator<Item = (usize, &LogRecord)> {
        self.logs
            .iter()
            .enumerate()
            .filter(|(_, record)| record.can_undo())
    }

    pub fn is_busy(&self, action: ActionKind) -> bool {
        self.busy.contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{log_record, PERSON_QUERY};
    use crate::domain::activity::LogStatus;

    fn view() -> ConsoleViewModel {
        ConsoleViewModel {
            nl_text: String::new(),
            last_generated: None,
            statement: Statement::from(PERSON_QUERY),
            validation: None,
            explain: None,
            token: None,
            select: None,
            terms: None,
            backend_reachable: None,
            notice: None,
            busy: vec![ActionKind::Preview],
            logs: vec![
                log_record(LogStatus::Failed, Some("DELETE DATA {}")),
                log_record(LogStatus::Applied, Some("DELETE DATA {}")),
                log_record(LogStatus::Applied, None),
            ],
            log_limit: None,
            perf: None,
            perf_window_minutes: None,
        }
    }

    #[test]
    fn only_applied_records_with_undo_are_offered() {
        let view = view();
        let offered: Vec<usize> = view.undoable_logs().map(|(index, _)| index).collect();
        assert_eq!(offered, vec![1]);
    }

    #[test]
    fn execute_gate_follows_token_view() {
        let mut view = view();
        assert!(!view.can_execute());
        assert!(view.can_run_select());
        assert!(view.is_busy(ActionKind::Preview));

        view.token = Some(TokenView {
            expires_at: Utc::now(),
            seconds_remaining: 0,
            executable: false,
        });
        assert!(!view.can_execute());
        view.token = Some(TokenView {
            expires_at: Utc::now(),
            seconds_remaining: 12,
            executable: true,
        });
        assert!(view.can_execute());
    }
}
