use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use npc_merge::build::{BuildOutcome, BuildPipeline, BuildTaskState, Stage, TaskContext};
use tokio_util::sync::CancellationToken;
use npc_merge::{NpcError, Result};

/// Records its name into the state after walking `items` items.
struct Step {
    name: &'static str,
    items: usize,
    fail: bool,
}

impl Step {
    fn ok(name: &'static str, items: usize) -> Self {
        Self {
            name,
            items,
            fail: false,
        }
    }
}

impl Stage<Vec<String>> for Step {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, state: &mut Vec<String>, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.set_item_count(self.items);
        for i in 0..self.items {
            ctx.next_item(&format!("{}-{i}", self.name))?;
        }
        if self.fail {
            return Err(NpcError::Argument(format!("{} broke", self.name)));
        }
        state.push(self.name.to_string());
        Ok(())
    }
}

/// Stops after item `stop_after`, reports it and waits for the test.
struct Gate {
    items: usize,
    stop_after: usize,
    reached: Sender<()>,
    proceed: Receiver<()>,
}

impl Stage<Vec<String>> for Gate {
    fn name(&self) -> &str {
        "Gate"
    }

    fn run(&self, _state: &mut Vec<String>, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.set_item_count(self.items);
        for i in 0..self.items {
            ctx.next_item(&i.to_string())?;
            if i + 1 == self.stop_after {
                let _ = self.reached.send(());
                let _ = self.proceed.recv();
            }
        }
        Ok(())
    }
}

/// Walks its items, then cancels the whole build and returns `Ok`.
struct CancelAfterLastItem {
    items: usize,
    token: CancellationToken,
}

impl Stage<Vec<String>> for CancelAfterLastItem {
    fn name(&self) -> &str {
        "Cancels"
    }

    fn run(&self, _state: &mut Vec<String>, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.set_item_count(self.items);
        for i in 0..self.items {
            ctx.next_item(&i.to_string())?;
        }
        self.token.cancel();
        Ok(())
    }
}

/// Panics after reporting its first item.
struct Boom;

impl Stage<Vec<String>> for Boom {
    fn name(&self) -> &str {
        "Boom"
    }

    fn run(&self, _state: &mut Vec<String>, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.set_item_count(3);
        ctx.next_item("first")?;
        panic!("stage exploded");
    }
}

fn gate(items: usize, stop_after: usize) -> (Gate, Receiver<()>, Sender<()>) {
    let (reached_tx, reached_rx) = bounded(1);
    let (proceed_tx, proceed_rx) = bounded(1);
    let gate = Gate {
        items,
        stop_after,
        reached: reached_tx,
        proceed: proceed_rx,
    };
    (gate, reached_rx, proceed_tx)
}

#[test]
fn stages_run_in_order() {
    let pipeline = BuildPipeline::new()
        .stage(Step::ok("A", 2))
        .stage(Step::ok("B", 3));
    let tasks = pipeline.tasks().to_vec();
    match pipeline.run(Vec::new()) {
        BuildOutcome::Completed(order) => assert_eq!(order, vec!["A", "B"]),
        other => panic!("unexpected outcome: {other:?}"),
    }
    for task in &tasks {
        assert_eq!(task.state(), BuildTaskState::Completed);
        assert_eq!(task.item_index(), task.item_count());
    }
}

#[test]
fn failure_stops_later_stages() {
    let pipeline = BuildPipeline::new()
        .stage(Step::ok("A", 1))
        .stage(Step {
            name: "B",
            items: 2,
            fail: true,
        })
        .stage(Step::ok("C", 1));
    let tasks = pipeline.tasks().to_vec();
    match pipeline.run(Vec::new()) {
        BuildOutcome::Failed { task, error } => {
            assert_eq!(task, "B");
            assert!(error.to_string().contains("B broke"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(tasks[0].state(), BuildTaskState::Completed);
    assert_eq!(tasks[1].state(), BuildTaskState::Failed);
    assert!(tasks[1].error().is_some());
    assert_eq!(tasks[2].state(), BuildTaskState::NotStarted);
}

#[test]
fn failed_outcome_converts_to_task_failed_error() {
    let outcome = BuildPipeline::new()
        .stage(Step {
            name: "Only",
            items: 0,
            fail: true,
        })
        .run(Vec::new());
    match outcome.into_result() {
        Err(NpcError::TaskFailed { task, .. }) => assert_eq!(task, "Only"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn cancel_mid_stage_keeps_progress() {
    let (gate, reached, proceed) = gate(10, 3);
    let pipeline = BuildPipeline::new().stage(gate).stage(Step::ok("After", 1));
    let indices = pipeline.tasks()[0].subscribe_item_index();
    let run = pipeline.start(Vec::new()).unwrap();
    let tasks = run.tasks().to_vec();

    reached.recv_timeout(Duration::from_secs(5)).unwrap();
    run.cancel();
    proceed.send(()).unwrap();

    let outcome = run.wait();
    // Signals are closed by `wait`, so this drains everything ever published.
    assert_eq!(indices.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert!(outcome.is_cancelled());
    assert_eq!(tasks[0].state(), BuildTaskState::Cancelled);
    assert_eq!(tasks[0].item_index(), 3);
    assert_eq!(tasks[0].item_count(), 10);
    assert_eq!(tasks[1].state(), BuildTaskState::NotStarted);
    assert!(matches!(outcome.into_result(), Err(NpcError::Cancelled)));
}

#[test]
fn cancel_before_start_runs_nothing() {
    let pipeline = BuildPipeline::new().stage(Step::ok("A", 1));
    let tasks = pipeline.tasks().to_vec();
    pipeline.cancellation_token().cancel();
    match pipeline.run(Vec::new()) {
        BuildOutcome::Cancelled { task } => assert_eq!(task, "A"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(tasks[0].state(), BuildTaskState::NotStarted);
}

#[test]
fn pause_holds_progress_until_resumed() {
    let (gate, reached, proceed) = gate(4, 1);
    let run = BuildPipeline::new().stage(gate).start(Vec::new()).unwrap();
    let task = Arc::clone(&run.tasks()[0]);

    reached.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(run.pause());
    proceed.send(()).unwrap();

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(task.state(), BuildTaskState::Paused);
    assert_eq!(task.item_index(), 1);
    assert!(!run.is_finished());

    assert!(run.resume());
    assert!(run.wait().is_completed());
    assert_eq!(task.state(), BuildTaskState::Completed);
    assert_eq!(task.item_index(), 4);
}

#[test]
fn cancel_wakes_a_paused_task() {
    let (gate, reached, proceed) = gate(4, 2);
    let run = BuildPipeline::new().stage(gate).start(Vec::new()).unwrap();
    let task = Arc::clone(&run.tasks()[0]);

    reached.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(run.pause());
    proceed.send(()).unwrap();
    run.cancel();

    assert!(run.wait().is_cancelled());
    assert_eq!(task.state(), BuildTaskState::Cancelled);
    assert_eq!(task.item_index(), 2);
}

#[test]
fn empty_stage_reports_one_of_one() {
    let pipeline = BuildPipeline::new().stage(Step::ok("Empty", 0));
    let task = Arc::clone(&pipeline.tasks()[0]);
    assert!(pipeline.run(Vec::new()).is_completed());
    assert_eq!(task.item_count(), 1);
    assert_eq!(task.item_index(), 1);
}

#[test]
fn state_subscribers_see_every_transition() {
    let pipeline = BuildPipeline::new().stage(Step::ok("A", 2));
    let states = pipeline.tasks()[0].subscribe_state();
    let indices = pipeline.tasks()[0].subscribe_item_index();
    assert!(pipeline.start(Vec::new()).unwrap().wait().is_completed());

    let seen: Vec<BuildTaskState> = states.iter().collect();
    assert_eq!(
        seen,
        vec![
            BuildTaskState::NotStarted,
            BuildTaskState::Running,
            BuildTaskState::Completed
        ]
    );
    let seen: Vec<usize> = indices.iter().collect();
    assert_eq!(seen, vec![0, 1, 2]);
}

#[test]
fn cancel_after_last_item_cancels_the_running_task() {
    let pipeline = BuildPipeline::new();
    let token = pipeline.cancellation_token();
    let pipeline = pipeline
        .stage(CancelAfterLastItem { items: 2, token })
        .stage(Step::ok("After", 1));
    let tasks = pipeline.tasks().to_vec();
    let states = tasks[0].subscribe_state();

    match pipeline.run(Vec::new()) {
        BuildOutcome::Cancelled { task } => assert_eq!(task, "Cancels"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(tasks[0].state(), BuildTaskState::Cancelled);
    assert_eq!(tasks[0].item_index(), 2);
    assert_eq!(tasks[1].state(), BuildTaskState::NotStarted);

    tasks[0].dispose();
    assert_eq!(states.iter().last(), Some(BuildTaskState::Cancelled));
}

#[test]
fn panicking_stage_fails_its_task() {
    let pipeline = BuildPipeline::new().stage(Boom).stage(Step::ok("After", 1));
    let tasks = pipeline.tasks().to_vec();

    match pipeline.start(Vec::new()).unwrap().wait() {
        BuildOutcome::Failed { task, error } => {
            assert_eq!(task, "Boom");
            assert!(matches!(&*error, NpcError::Panicked(m) if m.contains("stage exploded")));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(tasks[0].state(), BuildTaskState::Failed);
    assert!(matches!(tasks[0].error().as_deref(), Some(NpcError::Panicked(_))));
    assert_eq!(tasks[0].item_index(), 1);
    assert_eq!(tasks[1].state(), BuildTaskState::NotStarted);
}

#[test]
fn pause_after_last_item_still_completes() {
    let (gate, reached, proceed) = gate(2, 2);
    let run = BuildPipeline::new()
        .stage(gate)
        .stage(Step::ok("After", 1))
        .start(Vec::new())
        .unwrap();
    let tasks = run.tasks().to_vec();

    reached.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(run.pause());
    proceed.send(()).unwrap();

    assert!(run.wait().is_completed());
    assert_eq!(tasks[0].state(), BuildTaskState::Completed);
    assert_eq!(tasks[1].state(), BuildTaskState::Completed);
}
