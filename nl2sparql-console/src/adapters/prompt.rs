use crate::ports::prompt_port::{ConfirmRequest, ConfirmationPrompt};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tokio::task;
use tracing::warn;

/// Answers every confirmation the same way. Backs `--yes`.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm {
    answer: bool,
}

impl AutoConfirm {
    pub fn new(answer: bool) -> Self {
        Self { answer }
    }
}

#[async_trait]
impl ConfirmationPrompt for AutoConfirm {
    async fn confirm(&self, _request: &ConfirmRequest) -> bool {
        self.answer
    }
}

/// Asks on the controlling terminal; anything but y/yes declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl ConfirmationPrompt for TerminalPrompt {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        let question = format!("{}\n{}\n[y/N] ", request.headline(), request.statement.trim());
        let answer = task::spawn_blocking(move || -> io::Result<String> {
            let mut stdout = io::stdout();
            stdout.write_all(question.as_bytes())?;
            stdout.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;
        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(err)) => {
                warn!(%err, "confirmation prompt failed; treating as declined");
                false
            }
            Err(err) => {
                warn!(%err, "confirmation prompt task aborted; treating as declined");
                false
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::prompt_port::ConfirmSubject;

    #[test]
    fn only_yes_confirms() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }

    #[tokio::test]
    async fn auto_confirm_returns_fixed_answer() {
        let request = ConfirmRequest {
            subject: ConfirmSubject::Execute {
                seconds_remaining: 12,
            },
            statement: "INSERT DATA {}".into(),
        };
        assert!(AutoConfirm::new(true).confirm(&request).await);
        assert!(!AutoConfirm::new(false).confirm(&request).await);
    }
}
