//! Canonical in-memory task list published as immutable snapshots.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tasklist_core::{Task, TaskId};
use tokio::sync::watch;

/// Immutable view of the store at one point in time.
pub type TaskList = Arc<[Task]>;

/// Ordered task collection.
///
/// Each mutation is applied atomically and publishes a fresh [`TaskList`];
/// readers holding an older snapshot never observe a partial update.
#[derive(Debug)]
pub struct TaskStore {
    tx: watch::Sender<TaskList>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let empty: TaskList = Arc::from(Vec::new());
        Self {
            tx: watch::Sender::new(empty),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TaskList {
        Arc::clone(&*self.tx.borrow())
    }

    /// Observe every future snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskList> {
        self.tx.subscribe()
    }

    /// Number of tasks in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Whether the current snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Look up a task by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tx.borrow().iter().find(|task| task.id == id).cloned()
    }

    /// Whether a task with exactly this name exists (case-sensitive).
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.tx.borrow().iter().any(|task| task.name == name)
    }

    /// Replace the whole list, sorted by creation time, newest first.
    ///
    /// The sort is stable so equal timestamps keep server order. Repeated ids
    /// keep their first occurrence.
    pub fn replace_all(&self, tasks: Vec<Task>) {
        let mut seen = HashSet::with_capacity(tasks.len());
        let mut tasks: Vec<Task> = tasks.into_iter().filter(|task| seen.insert(task.id)).collect();
        tasks.sort_by(compare_newest_first);
        self.tx.send_replace(Arc::from(tasks));
    }

    /// Append a task without re-sorting. An existing entry with the same id
    /// is replaced in place instead.
    pub fn insert(&self, task: Task) {
        self.tx.send_modify(|list| {
            let mut next = list.to_vec();
            if let Some(slot) = next.iter_mut().find(|existing| existing.id == task.id) {
                *slot = task;
            } else {
                next.push(task);
            }
            *list = Arc::from(next);
        });
    }

    /// Apply `patch` to the task with `id`. Returns `false` (and publishes
    /// nothing) when the id is not present.
    ///
    /// `id` and `created_at` are immutable: they are restored after the patch.
    pub fn update(&self, id: TaskId, patch: impl FnOnce(&mut Task)) -> bool {
        self.tx.send_if_modified(|list| {
            let Some(index) = list.iter().position(|task| task.id == id) else {
                return false;
            };
            let mut next = list.to_vec();
            let slot = &mut next[index];
            let created_at = slot.created_at;
            patch(slot);
            slot.id = id;
            slot.created_at = created_at;
            *list = Arc::from(next);
            true
        })
    }

    /// Remove the task with `id`, returning it if it was present.
    pub fn remove(&self, id: TaskId) -> Option<Task> {
        let mut removed = None;
        self.tx.send_if_modified(|list| {
            let Some(index) = list.iter().position(|task| task.id == id) else {
                return false;
            };
            let mut next = list.to_vec();
            removed = Some(next.remove(index));
            *list = Arc::from(next);
            true
        });
        removed
    }
}

fn compare_newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}
