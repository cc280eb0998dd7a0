//! User-facing confirmation and notice collaborator.

/// Severity attached to a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// The requested action completed.
    Success,
    /// Neutral outcome, e.g. a declined confirmation.
    Info,
    /// Something went wrong but nothing was lost.
    Warning,
    /// The request was rejected.
    Error,
}

impl NoticeKind {
    /// Lowercase label used when rendering the notice as text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Content of a yes/no question shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    /// Short headline.
    pub title: String,
    /// Explanation of what happens on confirmation.
    pub body: String,
    /// Whether confirming destroys data.
    pub danger: bool,
}

impl ConfirmRequest {
    /// Question asked before a task is deleted.
    #[must_use]
    pub fn delete_task() -> Self {
        Self {
            title: "Are you sure?".to_owned(),
            body: "Once deleted, you will not be able to recover this task!".to_owned(),
            danger: true,
        }
    }
}

/// Interaction boundary between the controller and whatever renders it.
///
/// `confirm` is a suspension point: the controller awaits the answer without
/// blocking other work. `notify` is fire-and-forget.
#[allow(async_fn_in_trait)]
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question; `true` means the user agreed.
    async fn confirm(&self, request: &ConfirmRequest) -> bool;

    /// Report an outcome to the user.
    fn notify(&self, message: &str, kind: NoticeKind);
}

#[allow(clippy::future_not_send)]
impl<P: Prompt> Prompt for std::sync::Arc<P> {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        (**self).confirm(request).await
    }

    fn notify(&self, message: &str, kind: NoticeKind) {
        (**self).notify(message, kind);
    }
}
