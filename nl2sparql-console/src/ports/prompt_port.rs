use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmSubject {
    Execute { seconds_remaining: i64 },
    Undo { recorded_at: String },
}

/// What the operator is asked to approve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub subject: ConfirmSubject,
    pub statement: String,
}

impl ConfirmRequest {
    pub fn headline(&self) -> String {
        match &self.subject {
            ConfirmSubject::Execute { seconds_remaining } => format!(
                "Execute update now? Token valid for {}s.",
                seconds_remaining
            ),
            ConfirmSubject::Undo { recorded_at } => {
                format!("Undo the update recorded at {}?", recorded_at)
            }
        }
    }
}

/// Operator confirmation for actions with server-side effects.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> bool;
}
