use super::model::ActionKind;
use crate::app::notices::NoticeKind;
use crate::ports::remote_port::RemoteError;
use std::fmt;
use thiserror::Error;

/// Reasons an action is refused before any network call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Precondition {
    NoValidToken,
    NotASelect,
    UndoUnavailable,
    EmptyStatement,
    EmptyRequest,
    UnknownTemplate(usize),
}

impl Precondition {
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Precondition::NoValidToken => NoticeKind::Error,
            _ => NoticeKind::Info,
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NoValidToken => {
                f.write_str("no valid confirmation token; run preview or generate first")
            }
            Precondition::NotASelect => {
                f.write_str("only SELECT or ASK queries can be run here; use preview and execute for updates")
            }
            Precondition::UndoUnavailable => {
                f.write_str("only applied records with an undo statement can be undone")
            }
            Precondition::EmptyStatement => f.write_str("statement is empty"),
            Precondition::EmptyRequest => f.write_str("natural-language request is empty"),
            Precondition::UnknownTemplate(index) => write!(f, "no template #{}", index),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    LocalPrecondition(Precondition),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("{action} response discarded; the statement changed while it was in flight")]
    Stale { action: ActionKind },
    #[error("{action} cancelled at confirmation")]
    Declined { action: ActionKind },
}

impl ConsoleError {
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ConsoleError::LocalPrecondition(_) | ConsoleError::Declined { .. }
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, ConsoleError::Stale { .. })
    }

    pub fn precondition(&self) -> Option<&Precondition> {
        match self {
            ConsoleError::LocalPrecondition(precondition) => Some(precondition),
            _ => None,
        }
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
