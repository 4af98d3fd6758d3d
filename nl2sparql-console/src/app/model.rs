use crate::domain::session::{SessionEvent, Statement};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Ping,
    LoadTerms,
    Generate,
    Validate,
    Explain,
    Preview,
    Execute,
    RunSelect,
    KpsSample,
    Undo,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Ping => "ping",
            ActionKind::LoadTerms => "load_terms",
            ActionKind::Generate => "generate",
            ActionKind::Validate => "validate",
            ActionKind::Explain => "explain",
            ActionKind::Preview => "preview",
            ActionKind::Execute => "execute",
            ActionKind::RunSelect => "select",
            ActionKind::KpsSample => "kps_sample",
            ActionKind::Undo => "undo",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Ping => "Health check",
            ActionKind::LoadTerms => "Loading ontology terms",
            ActionKind::Generate => "Generate",
            ActionKind::Validate => "Validate",
            ActionKind::Explain => "Explain",
            ActionKind::Preview => "Preview",
            ActionKind::Execute => "Execute",
            ActionKind::RunSelect => "SELECT",
            ActionKind::KpsSample => "KPS sample",
            ActionKind::Undo => "Undo",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateOutcome {
    pub statement: Statement,
    pub model: Option<String>,
    pub attempts: Option<u32>,
    pub expires_at: DateTime<Utc>,
    pub events: Vec<SessionEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewOutcome {
    pub expires_at: DateTime<Utc>,
    pub validation_ok: Option<bool>,
    pub events: Vec<SessionEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecuteOutcome {
    pub message: String,
    pub undo_statement: Option<String>,
    /// False when an edit or a newer token already replaced the executed one.
    pub token_cleared: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoOutcome {
    pub message: String,
}
