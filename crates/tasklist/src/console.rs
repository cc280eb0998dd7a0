//! Terminal implementation of the confirmation/notice collaborator.

use tasklist_app::{ConfirmRequest, NoticeKind, Prompt};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Asks on stderr, reads the answer from stdin, prints notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsolePrompt {
    assume_yes: bool,
}

impl ConsolePrompt {
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompt for ConsolePrompt {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} {} [y/N] ", request.title, request.body);

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&line),
        }
    }

    fn notify(&self, message: &str, kind: NoticeKind) {
        eprintln!("{}", format_notice(message, kind));
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn format_notice(message: &str, kind: NoticeKind) -> String {
    format!("[{}] {message}", kind.as_str())
}
