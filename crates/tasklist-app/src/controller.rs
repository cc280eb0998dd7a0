//! Sync controller: turns user intents into gateway calls and store mutations.
//!
//! Every mutation is pessimistic. The store changes only after the gateway
//! confirms, and only with the record the server returned.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tasklist_core::{FilterMode, Task, TaskDraft, TaskId, TaskName, ValidationError, project};
use tasklist_remote::TaskGateway;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::edit_session::{CommitRefusal, EditSession, EditSessionManager};
use crate::error::SyncError;
use crate::prompt::{ConfirmRequest, NoticeKind, Prompt};
use crate::task_store::{TaskList, TaskStore};
use crate::view::{TaskListView, ViewState};

/// Notice shown when an added name is already taken.
pub const DUPLICATE_NAME_NOTICE: &str = "Task name already exists!";
/// Notice shown after a confirmed delete succeeded.
pub const DELETED_NOTICE: &str = "Your task has been deleted!";
/// Notice shown when the user declined a delete.
pub const KEPT_NOTICE: &str = "Your task is safe!";

/// UI signal that asked for the open edit to be saved. Both map to the same commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    /// The edit field lost focus.
    Blur,
    /// The user pressed Enter.
    Enter,
}

/// Result of [`SyncController::commit_edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The rename was confirmed by the server.
    Saved(Task),
    /// No edit session was open.
    NothingToCommit,
    /// The session is already being saved; no second request was made.
    AlreadySaving,
}

/// Result of [`SyncController::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Confirmed and removed.
    Deleted,
    /// The user declined; nothing happened.
    Kept,
}

#[derive(Debug, Default)]
struct Revisions {
    issued: HashMap<TaskId, u64>,
    applied: HashMap<TaskId, u64>,
}

impl Revisions {
    fn forget(&mut self, id: TaskId) {
        self.issued.remove(&id);
        self.applied.remove(&id);
    }

    fn retain_known(&mut self, store: &TaskStore) {
        self.issued.retain(|id, _| store.get(*id).is_some());
        self.applied.retain(|id, _| store.get(*id).is_some());
    }
}

/// Tasks created while a list request is in flight. The list response may
/// predate them, so they are carried over the replacement.
#[derive(Debug, Default)]
struct LoadJournal {
    loads_in_flight: usize,
    next_seq: u64,
    created: Vec<(u64, TaskId)>,
}

/// Orchestrates the store, the edit session and the view against a gateway.
///
/// Methods take `&self`, so several intents may be in flight at once on a
/// single-threaded executor. Locks are never held across an `.await`.
#[derive(Debug)]
pub struct SyncController<G, P> {
    gateway: G,
    prompt: P,
    store: TaskStore,
    session: EditSessionManager,
    view: ViewState,
    revisions: Mutex<Revisions>,
    pending_names: Mutex<HashSet<String>>,
    journal: Mutex<LoadJournal>,
}

// Futures are driven on a single-threaded executor.
#[allow(clippy::future_not_send)]
impl<G, P> SyncController<G, P>
where
    G: TaskGateway,
    P: Prompt,
{
    /// Build a controller with an empty store and the `All` filter.
    #[must_use]
    pub fn new(gateway: G, prompt: P) -> Self {
        Self::with_filter(gateway, prompt, FilterMode::default())
    }

    /// Build a controller with an empty store and `filter` selected.
    #[must_use]
    pub fn with_filter(gateway: G, prompt: P, filter: FilterMode) -> Self {
        Self {
            gateway,
            prompt,
            store: TaskStore::new(),
            session: EditSessionManager::new(),
            view: ViewState::new(filter),
            revisions: Mutex::new(Revisions::default()),
            pending_names: Mutex::new(HashSet::new()),
            journal: Mutex::new(LoadJournal::default()),
        }
    }

    /// Read access to the store.
    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Read access to the edit session.
    #[must_use]
    pub const fn session(&self) -> &EditSessionManager {
        &self.session
    }

    /// Fetch the full list and replace the store with it, newest first.
    ///
    /// The loading flag is raised for the duration of the request. On failure
    /// the store keeps its previous contents. Tasks added while the request
    /// was in flight survive the replacement, and an edit session whose task
    /// is gone afterwards is closed.
    ///
    /// # Errors
    /// [`SyncError::Gateway`] when the list request fails.
    pub async fn load(&self) -> Result<usize, SyncError> {
        let loading = self.view.begin_loading();
        let mark = self.open_journal();
        let result = self.gateway.list().await;
        let created = self.close_journal(mark);
        drop(loading);

        match result {
            Ok(tasks) => {
                let carried: Vec<Task> = created
                    .into_iter()
                    .filter_map(|id| self.store.get(id))
                    .collect();
                self.store.replace_all(tasks);
                for task in carried {
                    if self.store.get(task.id).is_none() {
                        debug!(task = %task.id, "keeping task created during load");
                        self.store.insert(task);
                    }
                }
                lock(&self.revisions).retain_known(&self.store);
                if let Some(id) = self.session.current().task()
                    && self.store.get(id).is_none()
                {
                    debug!(task = %id, "closing edit of task missing after load");
                    self.session.clear_if_references(id);
                }
                let count = self.store.len();
                info!(count, "loaded tasks");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                Err(err.into())
            }
        }
    }

    /// Create a task named `raw` (trimmed).
    ///
    /// A blank name is rejected silently. A name equal to an existing task, or
    /// to a create still in flight, is rejected with an error notice.
    ///
    /// # Errors
    /// [`SyncError::Validation`] before any request, or [`SyncError::Gateway`].
    pub async fn add(&self, raw: &str) -> Result<Task, SyncError> {
        let name = TaskName::parse(raw)?;
        let Some(_reservation) = self.reserve_name(&name) else {
            debug!(name = %name, "rejected duplicate task name");
            self.prompt.notify(DUPLICATE_NAME_NOTICE, NoticeKind::Error);
            return Err(ValidationError::DuplicateName {
                name: name.into_inner(),
            }
            .into());
        };

        let draft = TaskDraft::new(name);
        match self.gateway.create(&draft).await {
            Ok(task) => {
                info!(task = %task.id, name = %task.name, "created task");
                self.store.insert(task.clone());
                self.record_created(task.id);
                Ok(task)
            }
            Err(err) => {
                warn!(name = %draft.name, error = %err, "failed to create task");
                Err(err.into())
            }
        }
    }

    /// Flip the completion flag of `id`.
    ///
    /// # Errors
    /// [`SyncError::UnknownTask`], [`SyncError::Gateway`] or
    /// [`SyncError::Superseded`].
    pub async fn toggle(&self, id: TaskId) -> Result<Task, SyncError> {
        let current = self.store.get(id).ok_or(SyncError::UnknownTask(id))?;
        self.send_update(id, &current.toggled()).await
    }

    /// Rename `id` to `raw` (trimmed). Uniqueness is not checked.
    ///
    /// # Errors
    /// [`SyncError::UnknownTask`], [`SyncError::Validation`] for a blank name,
    /// [`SyncError::Gateway`] or [`SyncError::Superseded`].
    pub async fn rename(&self, id: TaskId, raw: &str) -> Result<Task, SyncError> {
        let current = self.store.get(id).ok_or(SyncError::UnknownTask(id))?;
        let name = match TaskName::parse(raw) {
            Ok(name) => name,
            Err(err) => {
                self.prompt.notify(&err.to_string(), NoticeKind::Error);
                return Err(err.into());
            }
        };
        self.send_update(id, &current.renamed(name)).await
    }

    /// Ask for confirmation, then delete `id`.
    ///
    /// # Errors
    /// [`SyncError::UnknownTask`] (no prompt shown) or [`SyncError::Gateway`].
    pub async fn delete(&self, id: TaskId) -> Result<DeleteOutcome, SyncError> {
        if self.store.get(id).is_none() {
            return Err(SyncError::UnknownTask(id));
        }
        if !self.prompt.confirm(&ConfirmRequest::delete_task()).await {
            debug!(task = %id, "delete declined");
            self.prompt.notify(KEPT_NOTICE, NoticeKind::Info);
            return Ok(DeleteOutcome::Kept);
        }

        if let Err(err) = self.gateway.delete(id).await {
            warn!(task = %id, error = %err, "failed to delete task");
            return Err(err.into());
        }
        self.store.remove(id);
        self.session.clear_if_references(id);
        lock(&self.revisions).forget(id);
        lock(&self.journal).created.retain(|(_, created)| *created != id);
        info!(task = %id, "deleted task");
        self.prompt.notify(DELETED_NOTICE, NoticeKind::Success);
        Ok(DeleteOutcome::Deleted)
    }

    /// Open an inline edit of `id`, replacing any open session.
    ///
    /// # Errors
    /// [`SyncError::UnknownTask`] when `id` is not in the store.
    pub fn begin_edit(&self, id: TaskId) -> Result<(), SyncError> {
        let task = self.store.get(id).ok_or(SyncError::UnknownTask(id))?;
        self.session.begin(id, &task.name);
        Ok(())
    }

    /// Replace the draft text. Returns `false` when no session is editing.
    pub fn update_draft(&self, text: &str) -> bool {
        self.session.update_draft(text)
    }

    /// Drop the open session without saving.
    pub fn cancel_edit(&self) -> bool {
        self.session.cancel()
    }

    /// Save the open session as a rename.
    ///
    /// On failure the session returns to editing with the draft intact so
    /// the user can retry.
    ///
    /// # Errors
    /// Whatever [`Self::rename`] returns for the draft.
    pub async fn commit_edit(&self, trigger: CommitTrigger) -> Result<CommitOutcome, SyncError> {
        let pending = match self.session.begin_commit() {
            Ok(pending) => pending,
            Err(CommitRefusal::Idle) => return Ok(CommitOutcome::NothingToCommit),
            Err(CommitRefusal::AlreadySaving) => {
                debug!(?trigger, "commit ignored, save already in flight");
                return Ok(CommitOutcome::AlreadySaving);
            }
        };
        debug!(task = %pending.task, ?trigger, "committing edit");

        let result = self.rename(pending.task, &pending.draft).await;
        // The server accepted a superseded rename, so the session is done.
        let settled = matches!(result, Ok(_) | Err(SyncError::Superseded(_)));
        self.session.finish_commit(&pending, settled);
        result.map(CommitOutcome::Saved)
    }

    /// Current edit session.
    #[must_use]
    pub fn edit_session(&self) -> EditSession {
        self.session.current()
    }

    /// Select the filter mode.
    pub fn set_filter(&self, mode: FilterMode) {
        self.view.set_filter(mode);
    }

    /// Selected filter mode.
    #[must_use]
    pub fn filter(&self) -> FilterMode {
        self.view.filter()
    }

    /// Whether the initial fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    /// Tasks visible under the current filter, in store order.
    #[must_use]
    pub fn visible(&self) -> Vec<Task> {
        project(&self.store.snapshot(), self.view.filter())
    }

    /// Loading indicator or the visible tasks.
    #[must_use]
    pub fn view(&self) -> TaskListView {
        if self.view.is_loading() {
            TaskListView::Loading
        } else {
            TaskListView::Ready(self.visible())
        }
    }

    /// Observe store snapshots.
    #[must_use]
    pub fn subscribe_tasks(&self) -> watch::Receiver<TaskList> {
        self.store.subscribe()
    }

    /// Observe filter mode changes.
    #[must_use]
    pub fn subscribe_filter(&self) -> watch::Receiver<FilterMode> {
        self.view.subscribe_filter()
    }

    /// Observe the loading flag.
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.view.subscribe_loading()
    }

    async fn send_update(&self, id: TaskId, task: &Task) -> Result<Task, SyncError> {
        let ticket = self.issue_ticket(id);
        match self.gateway.update(id, task).await {
            Ok(confirmed) => self.apply_update(id, ticket, confirmed),
            Err(err) => {
                warn!(task = %id, error = %err, "failed to update task");
                Err(err.into())
            }
        }
    }

    fn issue_ticket(&self, id: TaskId) -> u64 {
        let mut revisions = lock(&self.revisions);
        let issued = revisions.issued.entry(id).or_default();
        *issued += 1;
        *issued
    }

    /// Apply a server response unless a newer one already landed or the task
    /// is gone. Never inserts.
    fn apply_update(&self, id: TaskId, ticket: u64, confirmed: Task) -> Result<Task, SyncError> {
        let mut revisions = lock(&self.revisions);
        let applied = revisions.applied.get(&id).copied().unwrap_or_default();
        if ticket <= applied {
            debug!(task = %id, ticket, applied, "discarding out-of-order response");
            return Err(SyncError::Superseded(id));
        }
        if !self.store.update(id, |slot| *slot = confirmed) {
            debug!(task = %id, "discarding response for removed task");
            return Err(SyncError::Superseded(id));
        }
        revisions.applied.insert(id, ticket);
        drop(revisions);

        let task = self.store.get(id).ok_or(SyncError::Superseded(id))?;
        info!(task = %id, completed = task.completed, name = %task.name, "updated task");
        Ok(task)
    }

    fn open_journal(&self) -> u64 {
        let mut journal = lock(&self.journal);
        journal.loads_in_flight += 1;
        journal.next_seq
    }

    /// Ids created since `mark`. The journal is emptied once no load is in flight.
    fn close_journal(&self, mark: u64) -> Vec<TaskId> {
        let mut journal = lock(&self.journal);
        let created = journal
            .created
            .iter()
            .filter(|(seq, _)| *seq >= mark)
            .map(|(_, id)| *id)
            .collect();
        journal.loads_in_flight = journal.loads_in_flight.saturating_sub(1);
        if journal.loads_in_flight == 0 {
            journal.created.clear();
        }
        created
    }

    fn record_created(&self, id: TaskId) {
        let mut journal = lock(&self.journal);
        if journal.loads_in_flight == 0 {
            return;
        }
        let seq = journal.next_seq;
        journal.next_seq += 1;
        journal.created.push((seq, id));
    }

    fn reserve_name(&self, name: &TaskName) -> Option<NameReservation<'_>> {
        let mut pending = lock(&self.pending_names);
        if self.store.contains_name(name.as_str()) || !pending.insert(name.as_str().to_owned()) {
            return None;
        }
        Some(NameReservation {
            names: &self.pending_names,
            name: name.as_str().to_owned(),
        })
    }
}

/// Holds a name against concurrent adds until the create settles.
struct NameReservation<'a> {
    names: &'a Mutex<HashSet<String>>,
    name: String,
}

impl Drop for NameReservation<'_> {
    fn drop(&mut self) {
        lock(self.names).remove(&self.name);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use tasklist_remote::{GatewayError, Operation};
    use time::{Duration, OffsetDateTime};
    use tokio::sync::Notify;

    use super::*;

    fn ts(secs: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(secs)
    }

    fn task(id: i64, name: &str, completed: bool, created: i64) -> Task {
        Task {
            id: TaskId(id),
            name: name.into(),
            completed,
            created_at: ts(created),
        }
    }

    #[derive(Default)]
    struct GatewayState {
        tasks: Vec<Task>,
        next_id: i64,
        calls: Vec<String>,
        fail_next: Option<GatewayError>,
        list_gate: Option<Arc<Notify>>,
        update_gates: VecDeque<Arc<Notify>>,
    }

    /// In-memory server. The server applies each request immediately; the
    /// response can be held back with a gate to reorder completions.
    #[derive(Clone, Default)]
    struct MockGateway {
        inner: Arc<Mutex<GatewayState>>,
    }

    impl MockGateway {
        fn with_tasks(tasks: Vec<Task>) -> Self {
            let next_id = tasks.iter().map(|t| t.id.0).max().unwrap_or_default() + 1;
            let gateway = Self::default();
            {
                let mut state = gateway.guard();
                state.tasks = tasks;
                state.next_id = next_id;
            }
            gateway
        }

        fn guard(&self) -> MutexGuard<'_, GatewayState> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn calls(&self) -> Vec<String> {
            self.guard().calls.clone()
        }

        fn fail_next(&self, err: GatewayError) {
            self.guard().fail_next = Some(err);
        }

        fn hold_next_list(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.guard().list_gate = Some(Arc::clone(&gate));
            gate
        }

        fn hold_next_update(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.guard().update_gates.push_back(Arc::clone(&gate));
            gate
        }

        fn begin_call(&self, call: String) -> Result<(), GatewayError> {
            let mut state = self.guard();
            state.calls.push(call);
            state.fail_next.take().map_or(Ok(()), Err)
        }
    }

    impl TaskGateway for MockGateway {
        async fn list(&self) -> tasklist_remote::Result<Vec<Task>> {
            self.begin_call("list".into())?;
            let (tasks, gate) = {
                let mut state = self.guard();
                (state.tasks.clone(), state.list_gate.take())
            };
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(tasks)
        }

        async fn create(&self, draft: &TaskDraft) -> tasklist_remote::Result<Task> {
            self.begin_call(format!("create {}", draft.name))?;
            let mut state = self.guard();
            let created = Task {
                id: TaskId(state.next_id),
                name: draft.name.as_str().to_owned(),
                completed: draft.completed,
                created_at: draft.created_at,
            };
            state.next_id += 1;
            state.tasks.push(created.clone());
            Ok(created)
        }

        async fn update(&self, id: TaskId, task: &Task) -> tasklist_remote::Result<Task> {
            self.begin_call(format!("update {id}"))?;
            let (result, gate) = {
                let mut state = self.guard();
                let result = match state.tasks.iter_mut().find(|t| t.id == id) {
                    Some(slot) => {
                        *slot = task.clone();
                        Ok(task.clone())
                    }
                    None => Err(GatewayError::NotFound { id }),
                };
                (result, state.update_gates.pop_front())
            };
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        }

        async fn delete(&self, id: TaskId) -> tasklist_remote::Result<()> {
            self.begin_call(format!("delete {id}"))?;
            let mut state = self.guard();
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            if state.tasks.len() == before {
                return Err(GatewayError::NotFound { id });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct PromptState {
        answers: VecDeque<bool>,
        asked: Vec<ConfirmRequest>,
        notices: Vec<(String, NoticeKind)>,
    }

    #[derive(Clone, Default)]
    struct MockPrompt {
        inner: Arc<Mutex<PromptState>>,
    }

    impl MockPrompt {
        fn answering(answers: &[bool]) -> Self {
            let prompt = Self::default();
            prompt.guard().answers = answers.iter().copied().collect();
            prompt
        }

        fn guard(&self) -> MutexGuard<'_, PromptState> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn notices(&self) -> Vec<(String, NoticeKind)> {
            self.guard().notices.clone()
        }

        fn asked(&self) -> usize {
            self.guard().asked.len()
        }
    }

    impl Prompt for MockPrompt {
        async fn confirm(&self, request: &ConfirmRequest) -> bool {
            let mut state = self.guard();
            state.asked.push(request.clone());
            state.answers.pop_front().unwrap_or(false)
        }

        fn notify(&self, message: &str, kind: NoticeKind) {
            self.guard().notices.push((message.to_owned(), kind));
        }
    }

    type Controller = SyncController<MockGateway, MockPrompt>;

    async fn loaded(tasks: Vec<Task>, answers: &[bool]) -> (Controller, MockGateway, MockPrompt) {
        let gateway = MockGateway::with_tasks(tasks);
        let prompt = MockPrompt::answering(answers);
        let controller = SyncController::new(gateway.clone(), prompt.clone());
        controller
            .load()
            .await
            .unwrap_or_else(|err| panic!("load must succeed: {err}"));
        (controller, gateway, prompt)
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn load_sorts_newest_first_and_clears_loading() {
        let (controller, _, _) = loaded(
            vec![task(1, "old", false, 10), task(2, "new", false, 20)],
            &[],
        )
        .await;
        assert!(!controller.is_loading());
        assert_eq!(names(&controller.visible()), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn failed_load_leaves_store_empty_and_clears_loading() {
        let gateway = MockGateway::with_tasks(vec![task(1, "a", false, 10)]);
        gateway.fail_next(GatewayError::Network {
            operation: Operation::List,
            message: "connection refused".into(),
        });
        let controller = SyncController::new(gateway, MockPrompt::default());

        let Err(err) = controller.load().await else {
            panic!("load should fail");
        };
        assert!(matches!(err, SyncError::Gateway(GatewayError::Network { .. })));
        assert!(!controller.is_loading());
        assert_eq!(controller.view(), TaskListView::Ready(Vec::new()));
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected_before_the_gateway() {
        let (controller, gateway, prompt) = loaded(vec![task(1, "Write report", false, 10)], &[]).await;

        let Err(err) = controller.add("  Write report ").await else {
            panic!("duplicate should be rejected");
        };
        assert_eq!(
            err,
            SyncError::Validation(ValidationError::DuplicateName {
                name: "Write report".into()
            })
        );
        assert_eq!(controller.store().len(), 1);
        assert_eq!(gateway.calls(), vec!["list"]);
        assert_eq!(
            prompt.notices(),
            vec![(DUPLICATE_NAME_NOTICE.to_owned(), NoticeKind::Error)]
        );
    }

    #[tokio::test]
    async fn blank_add_is_rejected_silently() {
        let (controller, gateway, prompt) = loaded(Vec::new(), &[]).await;
        assert_eq!(
            controller.add("   ").await,
            Err(SyncError::Validation(ValidationError::EmptyName))
        );
        assert!(prompt.notices().is_empty());
        assert_eq!(gateway.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn add_appends_server_record_without_resorting() {
        let (controller, _, _) = loaded(vec![task(1, "Write report", false, 10)], &[]).await;

        let created = controller
            .add("Call Bob")
            .await
            .unwrap_or_else(|err| panic!("add must succeed: {err}"));

        assert_eq!(created.id, TaskId(2));
        assert!(!created.completed);
        let ids: Vec<_> = controller.store().snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TaskId(1), TaskId(2)]);
    }

    #[tokio::test]
    async fn concurrent_adds_of_same_name_reach_gateway_once() {
        let (controller, gateway, _) = loaded(Vec::new(), &[]).await;

        let (first, second) = tokio::join!(controller.add("Buy milk"), controller.add("Buy milk"));

        assert!(first.is_ok());
        assert!(matches!(
            second,
            Err(SyncError::Validation(ValidationError::DuplicateName { .. }))
        ));
        assert_eq!(gateway.calls(), vec!["list", "create Buy milk"]);
        assert_eq!(controller.store().len(), 1);
    }

    #[tokio::test]
    async fn failed_add_leaves_store_and_releases_name() {
        let (controller, gateway, _) = loaded(Vec::new(), &[]).await;
        gateway.fail_next(GatewayError::Validation {
            status: 422,
            message: "nope".into(),
        });

        assert!(matches!(
            controller.add("Buy milk").await,
            Err(SyncError::Gateway(GatewayError::Validation { .. }))
        ));
        assert!(controller.store().is_empty());
        assert!(controller.add("Buy milk").await.is_ok());
    }

    #[tokio::test]
    async fn toggle_twice_restores_flag_and_moves_between_filters() {
        let (controller, _, _) = loaded(vec![task(1, "Write report", false, 10)], &[]).await;

        let toggled = controller
            .toggle(TaskId(1))
            .await
            .unwrap_or_else(|err| panic!("toggle must succeed: {err}"));
        assert!(toggled.completed);

        controller.set_filter(FilterMode::Completed);
        assert_eq!(names(&controller.visible()), vec!["Write report"]);
        controller.set_filter(FilterMode::Active);
        assert!(controller.visible().is_empty());

        let restored = controller
            .toggle(TaskId(1))
            .await
            .unwrap_or_else(|err| panic!("toggle must succeed: {err}"));
        assert!(!restored.completed);
    }

    #[tokio::test]
    async fn failed_toggle_does_not_mutate_store() {
        let (controller, gateway, _) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        gateway.fail_next(GatewayError::Server {
            operation: Operation::Update(TaskId(1)),
            status: 500,
            message: "boom".into(),
        });

        assert!(controller.toggle(TaskId(1)).await.is_err());
        assert_eq!(controller.store().get(TaskId(1)), Some(task(1, "a", false, 10)));
    }

    #[tokio::test]
    async fn intents_on_unknown_ids_never_reach_the_gateway() {
        let (controller, gateway, prompt) = loaded(Vec::new(), &[true]).await;

        assert_eq!(controller.toggle(TaskId(9)).await, Err(SyncError::UnknownTask(TaskId(9))));
        assert_eq!(
            controller.rename(TaskId(9), "x").await,
            Err(SyncError::UnknownTask(TaskId(9)))
        );
        assert_eq!(controller.delete(TaskId(9)).await, Err(SyncError::UnknownTask(TaskId(9))));
        assert_eq!(controller.begin_edit(TaskId(9)), Err(SyncError::UnknownTask(TaskId(9))));
        assert_eq!(gateway.calls(), vec!["list"]);
        assert_eq!(prompt.asked(), 0);
    }

    #[tokio::test]
    async fn declined_delete_keeps_task_and_skips_gateway() {
        let (controller, gateway, prompt) = loaded(vec![task(1, "a", false, 10)], &[false]).await;

        assert_eq!(controller.delete(TaskId(1)).await, Ok(DeleteOutcome::Kept));
        assert_eq!(controller.store().len(), 1);
        assert_eq!(gateway.calls(), vec!["list"]);
        assert_eq!(prompt.notices(), vec![(KEPT_NOTICE.to_owned(), NoticeKind::Info)]);
    }

    #[tokio::test]
    async fn confirmed_delete_removes_task_and_clears_its_edit() {
        let (controller, _, prompt) = loaded(vec![task(1, "a", false, 10)], &[true]).await;
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));

        assert_eq!(controller.delete(TaskId(1)).await, Ok(DeleteOutcome::Deleted));
        assert!(controller.store().is_empty());
        assert_eq!(controller.edit_session(), EditSession::Idle);
        assert_eq!(prompt.notices(), vec![(DELETED_NOTICE.to_owned(), NoticeKind::Success)]);
        assert_eq!(prompt.guard().asked[0], ConfirmRequest::delete_task());
    }

    #[tokio::test]
    async fn delete_rejected_by_server_keeps_task() {
        let (controller, gateway, _) = loaded(vec![task(1, "a", false, 10)], &[true]).await;
        gateway.fail_next(GatewayError::NotFound { id: TaskId(1) });

        assert_eq!(
            controller.delete(TaskId(1)).await,
            Err(SyncError::Gateway(GatewayError::NotFound { id: TaskId(1) }))
        );
        assert_eq!(controller.store().len(), 1);
    }

    #[tokio::test]
    async fn drafts_never_touch_the_store_until_commit() {
        let (controller, _, _) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        let mut rx = controller.subscribe_tasks();
        rx.mark_unchanged();

        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        assert!(controller.update_draft("b"));
        assert!(!rx.has_changed().unwrap_or(true));

        let outcome = controller
            .commit_edit(CommitTrigger::Enter)
            .await
            .unwrap_or_else(|err| panic!("commit must succeed: {err}"));
        assert!(matches!(outcome, CommitOutcome::Saved(ref t) if t.name == "b"));
        assert_eq!(controller.edit_session(), EditSession::Idle);
        assert!(rx.has_changed().unwrap_or(false));
    }

    #[tokio::test]
    async fn blur_and_enter_for_one_save_issue_one_request() {
        let (controller, gateway, _) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        controller.update_draft("b");
        let gate = gateway.hold_next_update();

        let (enter, blur) = tokio::join!(controller.commit_edit(CommitTrigger::Enter), async {
            tokio::task::yield_now().await;
            let outcome = controller.commit_edit(CommitTrigger::Blur).await;
            gate.notify_one();
            outcome
        });

        assert!(matches!(enter, Ok(CommitOutcome::Saved(_))));
        assert_eq!(blur, Ok(CommitOutcome::AlreadySaving));
        assert_eq!(gateway.calls(), vec!["list", "update 1"]);
        assert_eq!(
            controller.commit_edit(CommitTrigger::Blur).await,
            Ok(CommitOutcome::NothingToCommit)
        );
    }

    #[tokio::test]
    async fn failed_commit_keeps_draft_for_retry() {
        let (controller, gateway, _) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        controller.update_draft("b");
        gateway.fail_next(GatewayError::Network {
            operation: Operation::Update(TaskId(1)),
            message: "timeout".into(),
        });

        assert!(controller.commit_edit(CommitTrigger::Enter).await.is_err());
        assert_eq!(
            controller.edit_session(),
            EditSession::Editing {
                task: TaskId(1),
                draft: "b".into()
            }
        );
        assert_eq!(controller.store().get(TaskId(1)).map(|t| t.name), Some("a".to_owned()));

        assert!(matches!(
            controller.commit_edit(CommitTrigger::Enter).await,
            Ok(CommitOutcome::Saved(_))
        ));
    }

    #[tokio::test]
    async fn blank_draft_is_rejected_with_notice() {
        let (controller, gateway, prompt) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        controller.update_draft("   ");

        assert_eq!(
            controller.commit_edit(CommitTrigger::Blur).await,
            Err(SyncError::Validation(ValidationError::EmptyName))
        );
        assert_eq!(gateway.calls(), vec!["list"]);
        assert_eq!(prompt.notices()[0].1, NoticeKind::Error);
        assert!(matches!(controller.edit_session(), EditSession::Editing { .. }));
    }

    #[tokio::test]
    async fn rename_response_after_delete_does_not_resurrect_task() {
        let (controller, gateway, _) = loaded(vec![task(1, "a", false, 10)], &[true]).await;
        let gate = gateway.hold_next_update();

        let (rename, delete) = tokio::join!(controller.rename(TaskId(1), "b"), async {
            tokio::task::yield_now().await;
            let outcome = controller.delete(TaskId(1)).await;
            gate.notify_one();
            outcome
        });

        assert_eq!(delete, Ok(DeleteOutcome::Deleted));
        assert_eq!(rename, Err(SyncError::Superseded(TaskId(1))));
        assert!(controller.store().is_empty());
    }

    #[tokio::test]
    async fn older_rename_response_cannot_clobber_newer_one() {
        let (controller, gateway, _) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        let gate = gateway.hold_next_update();

        let (first, second) = tokio::join!(controller.rename(TaskId(1), "first"), async {
            tokio::task::yield_now().await;
            let outcome = controller.rename(TaskId(1), "second").await;
            gate.notify_one();
            outcome
        });

        assert!(matches!(second, Ok(ref t) if t.name == "second"));
        assert_eq!(first, Err(SyncError::Superseded(TaskId(1))));
        assert_eq!(
            controller.store().get(TaskId(1)).map(|t| t.name),
            Some("second".to_owned())
        );
    }

    #[tokio::test]
    async fn fresh_session_survives_completion_of_older_commit() {
        let (controller, gateway, _) = loaded(
            vec![task(1, "a", false, 10), task(2, "b", false, 20)],
            &[],
        )
        .await;
        let gate = gateway.hold_next_update();
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        controller.update_draft("a2");

        let (commit, ()) = tokio::join!(controller.commit_edit(CommitTrigger::Enter), async {
            tokio::task::yield_now().await;
            controller
                .begin_edit(TaskId(2))
                .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
            gate.notify_one();
        });

        assert!(matches!(commit, Ok(CommitOutcome::Saved(_))));
        assert_eq!(controller.edit_session().task(), Some(TaskId(2)));
    }

    #[tokio::test]
    async fn reload_that_drops_edited_task_clears_session() {
        let (controller, gateway, _) = loaded(
            vec![task(1, "a", false, 10), task(2, "b", false, 20)],
            &[],
        )
        .await;
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        gateway.guard().tasks.retain(|t| t.id != TaskId(1));

        controller
            .load()
            .await
            .unwrap_or_else(|err| panic!("reload must succeed: {err}"));

        assert!(controller.store().get(TaskId(1)).is_none());
        assert_eq!(controller.edit_session(), EditSession::Idle);
        assert_eq!(
            controller.commit_edit(CommitTrigger::Enter).await,
            Ok(CommitOutcome::NothingToCommit)
        );
    }

    #[tokio::test]
    async fn reload_keeps_session_of_surviving_task() {
        let (controller, _, _) = loaded(vec![task(1, "a", false, 10)], &[]).await;
        controller
            .begin_edit(TaskId(1))
            .unwrap_or_else(|err| panic!("begin must succeed: {err}"));
        controller.update_draft("draft");

        controller
            .load()
            .await
            .unwrap_or_else(|err| panic!("reload must succeed: {err}"));

        assert_eq!(controller.edit_session().draft(), Some("draft"));
    }

    #[tokio::test]
    async fn reload_keeps_task_created_while_list_was_in_flight() {
        let (controller, gateway, _) = loaded(vec![task(1, "Write report", false, 10)], &[]).await;
        let gate = gateway.hold_next_list();

        let (count, created) = tokio::join!(controller.load(), async {
            tokio::task::yield_now().await;
            let created = controller.add("Call Bob").await;
            gate.notify_one();
            created
        });

        let created = created.unwrap_or_else(|err| panic!("add must succeed: {err}"));
        assert_eq!(count, Ok(2));
        let ids: Vec<_> = controller.store().snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TaskId(1), created.id]);
        assert!(lock(&controller.journal).created.is_empty());
    }

    #[tokio::test]
    async fn delete_and_reload_prune_revision_tickets() {
        let (controller, gateway, _) = loaded(
            vec![task(1, "a", false, 10), task(2, "b", false, 20)],
            &[true],
        )
        .await;
        for id in [TaskId(1), TaskId(2)] {
            controller
                .toggle(id)
                .await
                .unwrap_or_else(|err| panic!("toggle must succeed: {err}"));
        }

        assert_eq!(controller.delete(TaskId(1)).await, Ok(DeleteOutcome::Deleted));
        {
            let revisions = lock(&controller.revisions);
            assert!(!revisions.issued.contains_key(&TaskId(1)));
            assert!(!revisions.applied.contains_key(&TaskId(1)));
            assert!(revisions.applied.contains_key(&TaskId(2)));
        }

        gateway.guard().tasks.clear();
        controller
            .load()
            .await
            .unwrap_or_else(|err| panic!("reload must succeed: {err}"));
        let revisions = lock(&controller.revisions);
        assert!(revisions.issued.is_empty());
        assert!(revisions.applied.is_empty());
    }

    #[tokio::test]
    async fn view_reports_loading_while_list_is_in_flight() {
        let gateway = MockGateway::with_tasks(vec![task(1, "a", false, 10)]);
        let gate = gateway.hold_next_list();
        let controller = SyncController::new(gateway, MockPrompt::default());

        let (count, during) = tokio::join!(controller.load(), async {
            tokio::task::yield_now().await;
            let during = controller.view();
            gate.notify_one();
            during
        });

        assert_eq!(count, Ok(1));
        assert_eq!(during, TaskListView::Loading);
        assert!(!controller.is_loading());
        assert_eq!(controller.view(), TaskListView::Ready(vec![task(1, "a", false, 10)]));
    }
}
