//! Build task lifecycle and progress.
//!
//! A [`BuildTask`] is the observable side of one pipeline stage. Its state and
//! progress are written only by the pipeline and the running stage (through
//! [`TaskContext`]); everyone else subscribes.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::signal::Signal;
use crate::error::{NpcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildTaskState {
    NotStarted,
    Running,
    Paused,
    Cancelled,
    Failed,
    Completed,
}

impl BuildTaskState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed | Self::Completed)
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Running)
                | (Self::Running, Self::Paused)
                | (Self::Paused, Self::Running)
                | (
                    Self::Running,
                    Self::Completed | Self::Failed | Self::Cancelled
                )
                | (Self::Paused, Self::Cancelled)
        )
    }
}

impl fmt::Display for BuildTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
        })
    }
}

pub struct BuildTask {
    name: String,
    item_count: Signal<usize>,
    item_index: Signal<usize>,
    item_name: Signal<String>,
    state: Signal<BuildTaskState>,
    error: Mutex<Option<Arc<NpcError>>>,
    token: CancellationToken,
    paused: Mutex<bool>,
    resumed: Condvar,
    /// Serializes name + index updates from parallel item loops.
    progress: Mutex<()>,
}

impl BuildTask {
    /// Creates a task cancelled together with `parent`.
    pub fn new(name: impl Into<String>, parent: &CancellationToken) -> Self {
        Self {
            name: name.into(),
            item_count: Signal::new(0),
            item_index: Signal::new(0),
            item_name: Signal::new(String::new()),
            state: Signal::new(BuildTaskState::NotStarted),
            error: Mutex::new(None),
            token: parent.child_token(),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            progress: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BuildTaskState {
        self.state.get()
    }

    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    pub fn item_index(&self) -> usize {
        self.item_index.get()
    }

    pub fn item_name(&self) -> String {
        self.item_name.get()
    }

    /// Error that failed the task, if it failed.
    pub fn error(&self) -> Option<Arc<NpcError>> {
        self.error.lock().clone()
    }

    pub fn subscribe_state(&self) -> Receiver<BuildTaskState> {
        self.state.subscribe()
    }

    pub fn subscribe_item_count(&self) -> Receiver<usize> {
        self.item_count.subscribe()
    }

    pub fn subscribe_item_index(&self) -> Receiver<usize> {
        self.item_index.subscribe()
    }

    pub fn subscribe_item_name(&self) -> Receiver<String> {
        self.item_name.subscribe()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Requests cooperative cancellation. Wakes the task if it is paused.
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }
        debug!(task = %self.name, "Cancellation requested");
        self.token.cancel();
        let _guard = self.paused.lock();
        self.resumed.notify_all();
    }

    /// Pauses a running task at its next checkpoint.
    pub fn pause(&self) -> bool {
        let mut paused = self.paused.lock();
        if !self.transition(BuildTaskState::Paused) {
            return false;
        }
        *paused = true;
        info!(task = %self.name, "Task paused");
        true
    }

    pub fn resume(&self) -> bool {
        let mut paused = self.paused.lock();
        if !self.transition(BuildTaskState::Running) {
            return false;
        }
        *paused = false;
        self.resumed.notify_all();
        info!(task = %self.name, "Task resumed");
        true
    }

    /// Closes every signal. Values stay readable.
    pub fn dispose(&self) {
        self.item_count.close();
        self.item_index.close();
        self.item_name.close();
        self.state.close();
    }

    pub(crate) fn start(&self) -> bool {
        self.transition(BuildTaskState::Running)
    }

    pub(crate) fn complete(&self) -> bool {
        {
            let _progress = self.progress.lock();
            let count = self.item_count.get();
            if count == 0 {
                self.item_count.set(1);
                self.item_index.set(1);
            } else if self.item_index.get() < count {
                self.item_index.set(count);
            }
        }
        self.finish(BuildTaskState::Completed)
    }

    pub(crate) fn fail(&self, error: Arc<NpcError>) -> bool {
        warn!(task = %self.name, error = %error, "Task failed");
        *self.error.lock() = Some(error);
        self.finish(BuildTaskState::Failed)
    }

    pub(crate) fn mark_cancelled(&self) -> bool {
        self.finish(BuildTaskState::Cancelled)
    }

    /// Moves a task whose stage has returned into the terminal state `next`.
    ///
    /// A pause that arrived after the stage's last checkpoint is undone first.
    /// Both steps run under the pause lock, so a concurrent [`Self::pause`]
    /// either lands before (and is undone) or after (and is rejected).
    fn finish(&self, next: BuildTaskState) -> bool {
        let mut paused = self.paused.lock();
        if *paused && next != BuildTaskState::Cancelled {
            *paused = false;
            self.transition(BuildTaskState::Running);
        }
        self.transition(next)
    }

    /// Applies a state change if legal from the current state.
    fn transition(&self, next: BuildTaskState) -> bool {
        let mut from = None;
        let applied = self.state.try_update(|current| {
            from = Some(*current);
            current.can_transition_to(next).then_some(next)
        });
        if applied {
            debug!(task = %self.name, from = ?from, to = %next, "Task state changed");
        } else {
            debug!(task = %self.name, from = ?from, to = %next, "Rejected task state change");
        }
        applied
    }
}

impl fmt::Debug for BuildTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildTask")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("item_index", &self.item_index())
            .field("item_count", &self.item_count())
            .finish_non_exhaustive()
    }
}

impl Drop for BuildTask {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Handle given to a running stage for reporting progress and honouring
/// pause and cancellation.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    task: &'a BuildTask,
}

impl<'a> TaskContext<'a> {
    #[must_use]
    pub const fn new(task: &'a BuildTask) -> Self {
        Self { task }
    }

    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.task.token
    }

    pub fn set_item_count(&self, count: usize) {
        self.task.item_count.set(count);
    }

    /// Blocks while the task is paused. Fails with [`NpcError::Cancelled`]
    /// once cancellation has been requested.
    pub fn checkpoint(&self) -> Result<()> {
        let mut paused = self.task.paused.lock();
        while *paused && !self.task.is_cancelled() {
            self.task.resumed.wait(&mut paused);
        }
        if self.task.is_cancelled() {
            return Err(NpcError::Cancelled);
        }
        Ok(())
    }

    /// Reports the start of the next item. Checks for cancellation first and
    /// publishes nothing once cancelled.
    pub fn next_item(&self, name: &str) -> Result<()> {
        self.checkpoint()?;
        let _progress = self.task.progress.lock();
        if self.task.is_cancelled() {
            return Err(NpcError::Cancelled);
        }
        self.task.item_name.set(name.to_string());
        self.task.item_index.try_update(|index| Some(index + 1));
        Ok(())
    }
}
