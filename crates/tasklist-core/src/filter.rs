use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Task;

/// Subset selector over the task list. Process-local, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every task.
    #[default]
    All,
    /// Tasks that are not completed yet.
    Active,
    /// Completed tasks.
    Completed,
}

impl FilterMode {
    /// Every mode, in tab order.
    pub const ALL_MODES: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// String representation used in configuration files and CLI flags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Whether the task belongs to this subset.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a filter token is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filter mode: {token} (expected all, active or completed)")]
pub struct ParseFilterModeError {
    token: String,
}

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ParseFilterModeError {
                token: token.to_owned(),
            })
    }
}

/// Derive the visible subset of `tasks` for `mode`, preserving input order.
#[must_use]
pub fn project(tasks: &[Task], mode: FilterMode) -> Vec<Task> {
    tasks.iter().filter(|task| mode.matches(task)).cloned().collect()
}
