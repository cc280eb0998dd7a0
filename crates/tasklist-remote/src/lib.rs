//! Remote task gateway for the task list client.
//!
//! Wraps the four REST operations on the task collection resource:
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | list | `GET` | `{collection}` |
//! | create | `POST` | `{collection}` |
//! | update | `PUT` | `{collection}/{id}` |
//! | delete | `DELETE` | `{collection}/{id}` |
//!
//! The gateway performs no retries; every failure is terminal for that call.

pub mod config;
pub mod error;
pub mod http;

use std::sync::Arc;

use tasklist_core::{Task, TaskDraft, TaskId};

pub use config::{DEFAULT_BASE_URL, DEFAULT_COLLECTION_PATH, GatewayConfig};
pub use error::{GatewayError, Operation, Result};
pub use http::HttpTaskGateway;

/// Boundary between task intents and the remote collection.
///
/// Every method is a single request/response exchange.
#[allow(async_fn_in_trait)]
pub trait TaskGateway: Send + Sync {
    /// Fetch every task in server order.
    ///
    /// # Errors
    /// [`GatewayError::Network`] or [`GatewayError::Server`].
    async fn list(&self) -> Result<Vec<Task>>;

    /// Create a task; the returned record is authoritative (it carries the id).
    ///
    /// # Errors
    /// [`GatewayError::Validation`] when the server rejects the draft,
    /// otherwise [`GatewayError::Network`] or [`GatewayError::Server`].
    async fn create(&self, draft: &TaskDraft) -> Result<Task>;

    /// Replace the task stored under `id` with `task`.
    ///
    /// # Errors
    /// [`GatewayError::NotFound`] when `id` no longer exists server-side.
    async fn update(&self, id: TaskId, task: &Task) -> Result<Task>;

    /// Delete the task stored under `id`.
    ///
    /// # Errors
    /// [`GatewayError::NotFound`] when `id` no longer exists server-side.
    async fn delete(&self, id: TaskId) -> Result<()>;
}

#[allow(clippy::future_not_send)]
impl<G: TaskGateway> TaskGateway for Arc<G> {
    async fn list(&self) -> Result<Vec<Task>> {
        (**self).list().await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        (**self).create(draft).await
    }

    async fn update(&self, id: TaskId, task: &Task) -> Result<Task> {
        (**self).update(id, task).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        (**self).delete(id).await
    }
}
