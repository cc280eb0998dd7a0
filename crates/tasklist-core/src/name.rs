use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Client-side rejection of a task intent. Never reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The name is empty once surrounding whitespace is removed.
    #[error("task name must not be empty")]
    EmptyName,
    /// Another task already carries exactly this name.
    #[error("task name already exists: {name}")]
    DuplicateName {
        /// The rejected (trimmed) name.
        name: String,
    },
}

/// A trimmed, non-empty task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Trim user input and reject blank names.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyName`] for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the normalized name.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
