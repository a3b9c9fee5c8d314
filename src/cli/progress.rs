//! Progress reporting for npcm
//!
//! Provides adaptive progress feedback that works correctly in:
//! - TTY mode: Animated progress bars
//! - Non-TTY mode: Simple line-by-line output
//! - Robot mode: JSON progress events to stderr
//! - Quiet mode: No output
//!
//! Build stages are followed through their task signals:
//!
//! ```rust,ignore
//! let reporter = ProgressReporter::new(robot_mode, quiet);
//! let tracker = reporter.track(pipeline.tasks());
//! let outcome = pipeline.start(state)?.wait();
//! tracker.join();
//! ```

use std::cell::Cell;
use std::io::IsTerminal;
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use crossbeam_channel::{Receiver, select};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::warn;

use crate::build::{BuildTask, BuildTaskState};

/// Progress output mode based on terminal capabilities and user preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// TTY mode: animated progress bars
    Tty,
    /// Non-TTY mode: simple line-by-line output to stderr
    NonTty,
    /// Robot mode: JSON progress events to stderr
    Robot,
    /// Quiet mode: no progress output
    Quiet,
}

impl ProgressMode {
    /// Detect the appropriate progress mode based on environment
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }

    /// Check if this mode produces output
    #[must_use]
    pub const fn has_output(&self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventType {
    ProgressStart,
    ProgressUpdate,
    ProgressComplete,
    ProgressError,
}

/// JSON progress event for robot mode
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub event: ProgressEventType,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl ProgressEvent {
    fn new(event: ProgressEventType, operation: &str) -> Self {
        Self {
            event_type: "progress",
            event,
            operation: operation.to_string(),
            current: None,
            total: None,
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn with_progress(mut self, current: u64, total: Option<u64>) -> Self {
        self.current = Some(current);
        self.total = total;
        self
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{json}");
        }
    }
}

/// Creates progress bars that behave correctly in every output mode.
#[derive(Clone)]
pub struct ProgressReporter {
    multi: Option<MultiProgress>,
    mode: ProgressMode,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(robot_mode: bool, quiet: bool) -> Self {
        Self::with_mode(ProgressMode::detect(robot_mode, quiet))
    }

    #[must_use]
    pub fn with_mode(mode: ProgressMode) -> Self {
        let multi = if mode == ProgressMode::Tty {
            Some(MultiProgress::new())
        } else {
            None
        };

        Self { multi, mode }
    }

    #[must_use]
    pub const fn mode(&self) -> ProgressMode {
        self.mode
    }

    /// Create a progress bar for a determinate operation
    pub fn progress(&self, total: u64, msg: &str) -> ProgressHandle {
        match self.mode {
            ProgressMode::Quiet => ProgressHandle::Noop,

            ProgressMode::Robot => {
                ProgressEvent::new(ProgressEventType::ProgressStart, msg)
                    .with_progress(0, Some(total))
                    .emit();
                ProgressHandle::Robot {
                    operation: msg.to_string(),
                    total: Cell::new(Some(total)),
                }
            }

            ProgressMode::NonTty => {
                eprintln!("[npcm] {msg}...");
                ProgressHandle::NonTty {
                    operation: msg.to_string(),
                }
            }

            ProgressMode::Tty => {
                let pb = ProgressBar::new(total);
                match ProgressStyle::default_bar()
                    .template("{spinner:.cyan} {prefix:<26} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    Ok(style) => pb.set_style(style.progress_chars("█▓▒░")),
                    Err(err) => warn!(error = %err, "Invalid progress template"),
                }
                pb.set_prefix(msg.to_string());

                let pb = if let Some(ref multi) = self.multi {
                    multi.add(pb)
                } else {
                    pb
                };

                ProgressHandle::Tty(pb)
            }
        }
    }

    /// Follows every task on its own thread until the task reaches a
    /// terminal state or is disposed.
    ///
    /// Subscriptions are taken here, on the caller's thread, so no state
    /// change published after this call is missed.
    pub fn track(&self, tasks: &[Arc<BuildTask>]) -> TaskTracker {
        if !self.mode.has_output() {
            return TaskTracker {
                threads: Vec::new(),
            };
        }
        let threads = tasks
            .iter()
            .map(|task| {
                let reporter = self.clone();
                let task = Arc::clone(task);
                let states = task.subscribe_state();
                let indices = task.subscribe_item_index();
                std::thread::spawn(move || {
                    follow_task(&task, &states, &indices, |t| {
                        reporter.progress(t.item_count() as u64, t.name())
                    });
                })
            })
            .collect();
        TaskTracker { threads }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Threads following build tasks. Join after the build finishes.
pub struct TaskTracker {
    threads: Vec<JoinHandle<()>>,
}

impl TaskTracker {
    pub fn join(self) {
        for thread in self.threads {
            if thread.join().is_err() {
                warn!("Progress thread panicked");
            }
        }
    }
}

/// Something that displays one task's progress.
pub trait ProgressSink {
    fn set_length(&self, len: u64);
    fn set_position(&self, pos: u64);
    fn set_message(&self, msg: String);
    fn finish_with_message(&self, msg: &str);
    fn abandon_with_message(&self, msg: &str);
}

/// Mirrors `task` onto a sink opened when the task starts running, until
/// the task ends or its signals close. Returns the sink, if one was opened.
fn follow_task<S, F>(
    task: &BuildTask,
    states: &Receiver<BuildTaskState>,
    indices: &Receiver<usize>,
    mut open: F,
) -> Option<S>
where
    S: ProgressSink,
    F: FnMut(&BuildTask) -> S,
{
    let mut sink: Option<S> = None;

    // Both channels disconnect once the task is disposed, after its final state.
    loop {
        select! {
            recv(states) -> state => {
                let Ok(state) = state else { break };
                match state {
                    BuildTaskState::Running => match &sink {
                        None => sink = Some(open(task)),
                        Some(s) => s.set_message(String::new()),
                    },
                    BuildTaskState::Paused => {
                        if let Some(s) = &sink {
                            s.set_message("paused".to_string());
                        }
                    }
                    BuildTaskState::NotStarted => {}
                    _ => break,
                }
            }
            recv(indices) -> index => {
                let Ok(index) = index else { break };
                if let Some(s) = &sink {
                    s.set_length(task.item_count() as u64);
                    s.set_position(index as u64);
                    s.set_message(task.item_name());
                }
            }
        }
    }

    let state = task.state();
    if sink.is_none() && state.is_terminal() {
        sink = Some(open(task));
    }
    let sink = sink?;
    sink.set_length(task.item_count() as u64);
    sink.set_position(task.item_index() as u64);
    match state {
        BuildTaskState::Completed => sink.finish_with_message(task.name()),
        BuildTaskState::Cancelled => sink.abandon_with_message(&format!("{} cancelled", task.name())),
        BuildTaskState::Failed => {
            let reason = task.error().map(|e| e.to_string()).unwrap_or_default();
            sink.abandon_with_message(&format!("{}: {reason}", task.name()));
        }
        _ => sink.abandon_with_message(&format!("{} stopped", task.name())),
    }
    Some(sink)
}

/// Handle for updating or finishing a progress indicator
pub enum ProgressHandle {
    /// TTY mode: wraps an indicatif ProgressBar
    Tty(ProgressBar),

    /// Non-TTY mode: simple line output
    NonTty { operation: String },

    /// Robot mode: JSON events
    Robot {
        operation: String,
        total: Cell<Option<u64>>,
    },

    /// Quiet mode: no-op
    Noop,
}

impl ProgressSink for ProgressHandle {
    fn set_length(&self, len: u64) {
        match self {
            Self::Tty(pb) => pb.set_length(len),
            Self::Robot { total, .. } => total.set(Some(len)),
            Self::NonTty { .. } | Self::Noop => {}
        }
    }

    fn set_position(&self, pos: u64) {
        match self {
            Self::Tty(pb) => pb.set_position(pos),
            Self::Robot { operation, total } => {
                ProgressEvent::new(ProgressEventType::ProgressUpdate, operation)
                    .with_progress(pos, total.get())
                    .emit();
            }
            Self::NonTty { .. } | Self::Noop => {}
        }
    }

    fn set_message(&self, msg: String) {
        if let Self::Tty(pb) = self {
            pb.set_message(msg);
        }
    }

    fn finish_with_message(&self, msg: &str) {
        match self {
            Self::Tty(pb) => pb.finish_with_message(format!("✓ {msg}")),
            Self::Robot { operation, total } => {
                ProgressEvent::new(ProgressEventType::ProgressComplete, operation)
                    .with_progress(total.get().unwrap_or_default(), total.get())
                    .with_message(msg)
                    .emit();
            }
            Self::NonTty { .. } => eprintln!("[npcm] ✓ {msg}"),
            Self::Noop => {}
        }
    }

    fn abandon_with_message(&self, msg: &str) {
        match self {
            Self::Tty(pb) => pb.abandon_with_message(format!("✗ {msg}")),
            Self::Robot { operation, .. } => {
                ProgressEvent::new(ProgressEventType::ProgressError, operation)
                    .with_message(msg)
                    .emit();
            }
            Self::NonTty { operation } => eprintln!("[npcm] ✗ {operation}: {msg}"),
            Self::Noop => {}
        }
    }
}

impl ProgressHandle {
    /// Check if this handle does nothing (quiet mode)
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}
