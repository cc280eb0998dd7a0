//! Errors surfaced by controller intents.

use tasklist_core::{TaskId, ValidationError};
use tasklist_remote::GatewayError;
use thiserror::Error;

/// Failure of a controller intent. The store is never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Rejected locally before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The id is not present in the local store.
    #[error("task {0} is not in the list")]
    UnknownTask(TaskId),
    /// The remote call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The server accepted the update but a newer response (or a delete)
    /// already settled the task locally, so the response was discarded.
    #[error("response for task {0} was superseded")]
    Superseded(TaskId),
}

impl SyncError {
    /// Whether the failure happened before the gateway was called.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownTask(_))
    }
}
