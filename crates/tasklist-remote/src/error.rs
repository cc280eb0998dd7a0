//! Error types for remote task gateway operations.

use std::fmt;

use tasklist_core::TaskId;
use thiserror::Error;

/// Gateway call that produced an error, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET {collection}`
    List,
    /// `POST {collection}`
    Create,
    /// `PUT {collection}/{id}`
    Update(TaskId),
    /// `DELETE {collection}/{id}`
    Delete(TaskId),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Create => f.write_str("create"),
            Self::Update(id) => write!(f, "update of task {id}"),
            Self::Delete(id) => write!(f, "delete of task {id}"),
        }
    }
}

/// Errors that can occur while talking to the remote task collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced a response (unreachable host, timeout, broken body).
    #[error("Network error during {operation}: {message}")]
    Network {
        /// Failed call.
        operation: Operation,
        /// Transport diagnostic.
        message: String,
    },

    /// Non-2xx response, or a 2xx response whose body could not be decoded.
    #[error("Server error during {operation} (HTTP {status}): {message}")]
    Server {
        /// Failed call.
        operation: Operation,
        /// HTTP status code.
        status: u16,
        /// Response body or decoding diagnostic.
        message: String,
    },

    /// The server refused to create the task.
    #[error("Server rejected the new task (HTTP {status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The referenced task no longer exists server-side.
    #[error("Task not found on server: {id}")]
    NotFound {
        /// Missing task.
        id: TaskId,
    },

    /// Invalid gateway configuration (bad URL, client construction failure).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Classify a non-success HTTP status for the given operation.
    #[must_use]
    pub fn from_status(operation: Operation, status: u16, body: String) -> Self {
        match (operation, status) {
            (Operation::Create, 400 | 409 | 422) => Self::Validation { status, message: body },
            (Operation::Update(id) | Operation::Delete(id), 404) => Self::NotFound { id },
            _ => Self::Server {
                operation,
                status,
                message: body,
            },
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
