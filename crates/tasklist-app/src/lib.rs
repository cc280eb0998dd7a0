//! Client-side sync engine for the task list.
//!
//! The [`SyncController`] owns a [`TaskStore`], an [`EditSessionManager`] and the
//! view state, and drives a [`tasklist_remote::TaskGateway`]. Rendering and user
//! interaction stay outside this crate behind the [`Prompt`] trait.

pub mod config;
pub mod controller;
pub mod edit_session;
pub mod error;
pub mod prompt;
pub mod task_store;
pub mod view;

// Re-exports for convenience
pub use config::{AppConfig, RemoteSettings, ViewSettings};
pub use controller::{CommitOutcome, CommitTrigger, DeleteOutcome, SyncController};
pub use edit_session::{EditSession, EditSessionManager};
pub use error::SyncError;
pub use prompt::{ConfirmRequest, NoticeKind, Prompt};
pub use task_store::{TaskList, TaskStore};
pub use view::{TaskListView, ViewState};
