use chrono::{DateTime, Utc};

/// Source of a statement replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementOrigin {
    Edit,
    Template,
    KpsSample,
    Generated,
}

impl StatementOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementOrigin::Edit => "edit",
            StatementOrigin::Template => "template",
            StatementOrigin::KpsSample => "kps_sample",
            StatementOrigin::Generated => "generated",
        }
    }

    pub fn is_operator_edit(&self) -> bool {
        !matches!(self, StatementOrigin::Generated)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEventPayload {
    StatementReplaced {
        origin: StatementOrigin,
        token_cleared: bool,
    },
    ValidationAttached {
        ok: bool,
    },
    ExplainAttached,
    TokenIssued {
        expires_at: DateTime<Utc>,
        replaced: bool,
    },
    TokenCleared,
}

/// Sequenced record of one session transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEvent {
    pub sequence: u64,
    pub revision: u64,
    pub payload: SessionEventPayload,
}

impl SessionEvent {
    pub fn new(sequence: u64, revision: u64, payload: SessionEventPayload) -> Self {
        Self {
            sequence,
            revision,
            payload,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.payload {
            SessionEventPayload::StatementReplaced { .. } => "statement_replaced",
            SessionEventPayload::ValidationAttached { .. } => "validation_attached",
            SessionEventPayload::ExplainAttached => "explain_attached",
            SessionEventPayload::TokenIssued { .. } => "token_issued",
            SessionEventPayload::TokenCleared => "token_cleared",
        }
    }
}
