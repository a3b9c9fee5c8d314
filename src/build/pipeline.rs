//! Ordered execution of build stages.
//!
//! Stages run one after another over a shared build state. A stage starts
//! only after its predecessor completed; the first failure or cancellation
//! ends the run and leaves every later task `NotStarted`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn};

use super::task::{BuildTask, BuildTaskState, TaskContext};
use crate::error::{NpcError, Result};

/// One step of a build.
pub trait Stage<S>: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, state: &mut S, ctx: &TaskContext<'_>) -> Result<()>;
}

/// How a pipeline run ended.
#[derive(Debug)]
pub enum BuildOutcome<S> {
    Completed(S),
    Failed { task: String, error: Arc<NpcError> },
    Cancelled { task: String },
}

impl<S> BuildOutcome<S> {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn into_result(self) -> Result<S> {
        match self {
            Self::Completed(state) => Ok(state),
            Self::Failed { task, error } => Err(NpcError::TaskFailed {
                task,
                source: error,
            }),
            Self::Cancelled { .. } => Err(NpcError::Cancelled),
        }
    }
}

pub struct BuildPipeline<S> {
    stages: Vec<Box<dyn Stage<S>>>,
    tasks: Vec<Arc<BuildTask>>,
    token: CancellationToken,
}

impl<S> Default for BuildPipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> BuildPipeline<S> {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            tasks: Vec::new(),
            token: CancellationToken::new(),
        }
    }

    /// Appends a stage. Its task exists (as `NotStarted`) from now on so
    /// observers can subscribe before the run begins.
    #[must_use]
    pub fn stage<T>(mut self, stage: T) -> Self
    where
        T: Stage<S> + 'static,
    {
        self.tasks
            .push(Arc::new(BuildTask::new(stage.name(), &self.token)));
        self.stages.push(Box::new(stage));
        self
    }

    pub fn tasks(&self) -> &[Arc<BuildTask>] {
        &self.tasks
    }

    /// Token whose cancellation cancels every task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs every stage on the calling thread.
    pub fn run(self, mut state: S) -> BuildOutcome<S> {
        let _span = info_span!("build", stages = self.stages.len()).entered();
        for (stage, task) in self.stages.iter().zip(&self.tasks) {
            if self.token.is_cancelled() {
                warn!(task = %task.name(), "Build cancelled before task started");
                return BuildOutcome::Cancelled {
                    task: task.name().to_string(),
                };
            }

            task.start();
            info!(task = %task.name(), "Task started");
            let ctx = TaskContext::new(task);
            let result = catch_unwind(AssertUnwindSafe(|| -> Result<()> {
                ctx.checkpoint()?;
                stage.run(&mut state, &ctx)
            }))
            .unwrap_or_else(|payload| Err(NpcError::from_panic(payload.as_ref())));

            match result {
                Ok(()) if ctx.is_cancelled() => {
                    // Cancelled after the stage's last checkpoint.
                    return Self::cancelled(task);
                }
                Ok(()) => {
                    if !task.complete() {
                        warn!(task = %task.name(), state = %task.state(), "Task could not complete");
                    }
                    info!(task = %task.name(), items = task.item_count(), "Task completed");
                }
                Err(err) if err.is_cancelled() => return Self::cancelled(task),
                Err(err) => {
                    let err = Arc::new(err);
                    if !task.fail(Arc::clone(&err)) {
                        warn!(task = %task.name(), state = %task.state(), "Task could not record failure");
                    }
                    error!(task = %task.name(), error = %err, "Build aborted");
                    return BuildOutcome::Failed {
                        task: task.name().to_string(),
                        error: err,
                    };
                }
            }
        }
        BuildOutcome::Completed(state)
    }

    fn cancelled(task: &BuildTask) -> BuildOutcome<S> {
        task.mark_cancelled();
        warn!(task = %task.name(), "Task cancelled");
        BuildOutcome::Cancelled {
            task: task.name().to_string(),
        }
    }
}

impl<S: Send + 'static> BuildPipeline<S> {
    /// Runs the pipeline on a worker thread.
    pub fn start(self, state: S) -> Result<BuildRun<S>> {
        let tasks = self.tasks.clone();
        let token = self.token.clone();
        let handle = thread::Builder::new()
            .name("npcm-build".to_string())
            .spawn(move || self.run(state))?;
        Ok(BuildRun {
            tasks,
            token,
            handle,
        })
    }
}

/// A pipeline running in the background.
pub struct BuildRun<S> {
    tasks: Vec<Arc<BuildTask>>,
    token: CancellationToken,
    handle: thread::JoinHandle<BuildOutcome<S>>,
}

impl<S> BuildRun<S> {
    pub fn tasks(&self) -> &[Arc<BuildTask>] {
        &self.tasks
    }

    /// Cancels the running task and prevents later ones from starting.
    pub fn cancel(&self) {
        self.token.cancel();
        for task in &self.tasks {
            task.cancel();
        }
    }

    /// Pauses whichever task is running. Returns whether one was paused.
    pub fn pause(&self) -> bool {
        self.tasks
            .iter()
            .filter(|t| t.state() == BuildTaskState::Running)
            .fold(false, |any, t| t.pause() || any)
    }

    pub fn resume(&self) -> bool {
        self.tasks
            .iter()
            .filter(|t| t.state() == BuildTaskState::Paused)
            .fold(false, |any, t| t.resume() || any)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run to end, then closes every task's signals.
    pub fn wait(self) -> BuildOutcome<S> {
        let outcome = match self.handle.join() {
            Ok(outcome) => outcome,
            Err(payload) => {
                let error = Arc::new(NpcError::from_panic(payload.as_ref()));
                let active = self
                    .tasks
                    .iter()
                    .find(|t| matches!(t.state(), BuildTaskState::Running | BuildTaskState::Paused));
                if let Some(task) = active {
                    task.fail(Arc::clone(&error));
                }
                let task = active.map_or_else(|| "build".to_string(), |t| t.name().to_string());
                error!(task = %task, error = %error, "Build thread panicked");
                BuildOutcome::Failed { task, error }
            }
        };
        for task in &self.tasks {
            task.dispose();
        }
        outcome
    }
}
