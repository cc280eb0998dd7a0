//! Single-slot inline edit session.
//!
//! ```text
//! Idle ──begin──▶ Editing ──begin_commit──▶ Saving ──success──▶ Idle
//!   ▲               │  ▲                      │
//!   └────cancel─────┘  └───────failure────────┘
//! ```
//!
//! `begin` is accepted from every state and silently discards the previous
//! session (last writer wins). Each `begin` opens a new generation so the
//! completion of an older commit cannot close a fresher session.

use tasklist_core::TaskId;
use tokio::sync::watch;

/// Observable state of the edit slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    /// No task is being edited.
    #[default]
    Idle,
    /// The user is typing a new name.
    Editing {
        /// Task under edit.
        task: TaskId,
        /// Unsaved text buffer.
        draft: String,
    },
    /// The draft was handed to the controller and awaits the server.
    Saving {
        /// Task under edit.
        task: TaskId,
        /// Text being saved.
        draft: String,
    },
}

impl EditSession {
    /// Task referenced by the session, if any.
    #[must_use]
    pub const fn task(&self) -> Option<TaskId> {
        match self {
            Self::Idle => None,
            Self::Editing { task, .. } | Self::Saving { task, .. } => Some(*task),
        }
    }

    /// Current draft text, if any.
    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Editing { draft, .. } | Self::Saving { draft, .. } => Some(draft),
        }
    }

    /// Whether a commit for this session is in flight.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        matches!(self, Self::Saving { .. })
    }
}

/// Ticket handed out by [`EditSessionManager::begin_commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    /// Task to rename.
    pub task: TaskId,
    /// Draft text to save.
    pub draft: String,
    generation: u64,
}

/// Why [`EditSessionManager::begin_commit`] produced no ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRefusal {
    /// No session is open.
    Idle,
    /// The open session is already being saved.
    AlreadySaving,
}

#[derive(Debug, Default)]
struct Slot {
    session: EditSession,
    generation: u64,
}

/// Owner of the edit slot.
#[derive(Debug)]
pub struct EditSessionManager {
    tx: watch::Sender<EditSession>,
    // Generation lives beside the sender so both change under one lock.
    slot: std::sync::Mutex<Slot>,
}

impl Default for EditSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSessionManager {
    /// Create an idle manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(EditSession::Idle),
            slot: std::sync::Mutex::new(Slot::default()),
        }
    }

    /// Current session state.
    #[must_use]
    pub fn current(&self) -> EditSession {
        self.tx.borrow().clone()
    }

    /// Observe session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EditSession> {
        self.tx.subscribe()
    }

    /// Open a session for `task` with `current_name` as draft, discarding any
    /// previous session without confirmation.
    pub fn begin(&self, task: TaskId, current_name: &str) {
        self.with_slot(|slot| {
            slot.generation = slot.generation.wrapping_add(1);
            slot.session = EditSession::Editing {
                task,
                draft: current_name.to_owned(),
            };
            true
        });
    }

    /// Replace the draft buffer. Ignored unless the session is editing.
    pub fn update_draft(&self, text: &str) -> bool {
        self.with_slot(|slot| match &mut slot.session {
            EditSession::Editing { draft, .. } => {
                text.clone_into(draft);
                true
            }
            EditSession::Idle | EditSession::Saving { .. } => false,
        })
    }

    /// Close the session without side effects.
    pub fn cancel(&self) -> bool {
        self.with_slot(|slot| {
            let was_open = slot.session != EditSession::Idle;
            slot.session = EditSession::Idle;
            was_open
        })
    }

    /// Close the session if it references `task` (the task was deleted).
    pub fn clear_if_references(&self, task: TaskId) -> bool {
        self.with_slot(|slot| {
            if slot.session.task() != Some(task) {
                return false;
            }
            slot.session = EditSession::Idle;
            true
        })
    }

    /// Move the session from editing to saving and hand out its contents.
    ///
    /// # Errors
    /// Returns a [`CommitRefusal`] when there is nothing new to save, so a
    /// second save signal for the same draft never issues a second request.
    pub fn begin_commit(&self) -> Result<PendingCommit, CommitRefusal> {
        let mut outcome = Err(CommitRefusal::Idle);
        self.with_slot(|slot| {
            let generation = slot.generation;
            match std::mem::take(&mut slot.session) {
                EditSession::Editing { task, draft } => {
                    outcome = Ok(PendingCommit {
                        task,
                        draft: draft.clone(),
                        generation,
                    });
                    slot.session = EditSession::Saving { task, draft };
                    true
                }
                saving @ EditSession::Saving { .. } => {
                    outcome = Err(CommitRefusal::AlreadySaving);
                    slot.session = saving;
                    false
                }
                EditSession::Idle => false,
            }
        });
        outcome
    }

    /// Finish a commit. Success closes the session; failure returns it to
    /// editing with the draft intact. A session opened after `pending` was
    /// issued is left alone. Returns whether the slot was touched.
    pub fn finish_commit(&self, pending: &PendingCommit, success: bool) -> bool {
        self.with_slot(|slot| {
            if slot.generation != pending.generation || !slot.session.is_saving() {
                return false;
            }
            slot.session = if success {
                EditSession::Idle
            } else {
                EditSession::Editing {
                    task: pending.task,
                    draft: pending.draft.clone(),
                }
            };
            true
        })
    }

    fn with_slot(&self, apply: impl FnOnce(&mut Slot) -> bool) -> bool {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let changed = apply(&mut slot);
        if changed {
            self.tx.send_replace(slot.session.clone());
        }
        changed
    }
}
