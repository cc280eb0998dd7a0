//! Presentation state derived from the store: filter mode and loading flag.

use tasklist_core::{FilterMode, Task};
use tokio::sync::watch;

/// What a renderer should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListView {
    /// The initial fetch is in flight.
    Loading,
    /// Visible tasks under the current filter, in store order.
    Ready(Vec<Task>),
}

/// Process-local UI state. Not persisted.
#[derive(Debug)]
pub struct ViewState {
    filter: watch::Sender<FilterMode>,
    loading: watch::Sender<bool>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(FilterMode::default())
    }
}

impl ViewState {
    /// Start with `filter` selected and nothing loading.
    #[must_use]
    pub fn new(filter: FilterMode) -> Self {
        Self {
            filter: watch::Sender::new(filter),
            loading: watch::Sender::new(false),
        }
    }

    /// Selected filter mode.
    #[must_use]
    pub fn filter(&self) -> FilterMode {
        *self.filter.borrow()
    }

    /// Select a filter mode. Observers are woken only on change.
    pub fn set_filter(&self, mode: FilterMode) {
        self.filter.send_if_modified(|current| {
            let changed = *current != mode;
            *current = mode;
            changed
        });
    }

    /// Observe filter changes.
    #[must_use]
    pub fn subscribe_filter(&self) -> watch::Receiver<FilterMode> {
        self.filter.subscribe()
    }

    /// Whether the initial fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Observe loading flag changes.
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Raise the loading flag until the returned guard is dropped.
    #[must_use = "the loading flag is cleared when the guard drops"]
    pub fn begin_loading(&self) -> LoadingGuard<'_> {
        self.loading.send_replace(true);
        LoadingGuard { view: self }
    }
}

/// Clears the loading flag on drop, including when a load future is dropped.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    view: &'a ViewState,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.view.loading.send_replace(false);
    }
}
