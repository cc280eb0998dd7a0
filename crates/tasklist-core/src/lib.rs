//! Domain types & projection logic for the task list client.

/// Filter modes and the visible-subset projection.
pub mod filter;
/// Identifier types.
pub mod id;
/// Task name normalization and client-side validation.
pub mod name;
/// Wire format helpers for timestamps.
pub mod timestamp;

pub use crate::filter::{FilterMode, ParseFilterModeError, project};
pub use crate::id::TaskId;
pub use crate::name::{TaskName, ValidationError};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One unit of work as stored by the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier. Immutable.
    pub id: TaskId,
    /// Display name.
    pub name: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Creation time. Immutable.
    #[serde(with = "crate::timestamp", alias = "createdAt")]
    pub created_at: OffsetDateTime,
}

impl Task {
    /// Copy of this task with the completion flag flipped.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    /// Copy of this task carrying a new name.
    #[must_use]
    pub fn renamed(&self, name: TaskName) -> Self {
        Self {
            name: name.into_inner(),
            ..self.clone()
        }
    }
}

/// Creation payload sent before the server has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDraft {
    /// Trimmed task name.
    pub name: TaskName,
    /// Always `false` for new tasks.
    pub completed: bool,
    /// Client-side creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: OffsetDateTime,
}

impl TaskDraft {
    /// Draft a new, incomplete task created now.
    #[must_use]
    pub fn new(name: TaskName) -> Self {
        Self::at(name, OffsetDateTime::now_utc())
    }

    /// Draft a new, incomplete task with an explicit creation time.
    #[must_use]
    pub const fn at(name: TaskName, created_at: OffsetDateTime) -> Self {
        Self {
            name,
            completed: false,
            created_at,
        }
    }
}
