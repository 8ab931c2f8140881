//! Common types for polling-based task supervision.

use core::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::TaskResult;

/// Phase reported by a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPhase {
    /// Accepted but not yet running
    Pending,
    /// In progress
    Running,
    /// Finished successfully
    Success,
    /// Finished with an error
    Error,
}

impl TaskPhase {
    /// Whether no further transition can occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskPhase::Success | TaskPhase::Error)
    }
}

/// One status-poll result.
///
/// `progress` is the complete current payload, not a delta; the supervisor
/// replaces its copy wholesale on every poll. `result` is only meaningful
/// when `phase` is terminal.
#[derive(Debug, Clone)]
pub struct TaskObservation<P, R> {
    pub phase: TaskPhase,
    pub progress: P,
    pub result: Option<R>,
}

/// Terminal outcome of a supervised task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Error,
}

/// State of the supervisor itself.
///
/// Transitions are monotonic: `Idle → Starting → Polling →
/// Terminal(Success|Error)`, with `Cancelled` reachable from `Starting` or
/// `Polling`. There is no transition out of `Terminal` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLifecycle {
    /// Created, `begin()` not called yet
    Idle,
    /// Start call in flight
    Starting,
    /// Started; status polls scheduled on the cadence
    Polling,
    /// A poll reported a terminal phase, or the start call failed
    Terminal(TaskOutcome),
    /// Explicitly cancelled; the remote task, if any, continues untracked
    Cancelled,
}

impl TaskLifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskLifecycle::Terminal(_))
    }

    /// Whether `cancel()` would still have an effect.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskLifecycle::Starting | TaskLifecycle::Polling)
    }
}

/// Observable snapshot of a supervised task, cloned out to readers.
#[derive(Debug, Clone)]
pub struct TaskView<P, R> {
    pub lifecycle: TaskLifecycle,
    pub progress: P,
    pub result: Option<R>,
}

impl<P: Default, R> Default for TaskView<P, R> {
    fn default() -> Self {
        Self {
            lifecycle: TaskLifecycle::Idle,
            progress: P::default(),
            result: None,
        }
    }
}

/// A remote asynchronous task observed by polling.
///
/// `start` issues the one call that launches the task and returns an opaque
/// handle; `poll` fetches the current status for that handle. The supervisor
/// owns scheduling, terminal detection and cancellation. A task kind with no
/// terminal state (e.g. a log tail) simply never reports a terminal phase
/// and runs until cancelled.
#[async_trait]
pub trait PollTask: Send + Sync + 'static {
    /// Opaque token identifying the started task
    type Handle: Send + Sync + Debug + 'static;
    /// Payload replaced wholesale on every poll
    type Progress: Clone + Default + Send + Sync + 'static;
    /// Terminal result payload
    type Output: Clone + Debug + Send + Sync + 'static;

    /// Launch the task.
    ///
    /// # Errors
    ///
    /// An error here is terminal: the supervisor transitions straight to
    /// `Terminal(Error)` and never polls.
    async fn start(&self) -> TaskResult<Self::Handle>;

    /// Fetch the current status of a started task.
    ///
    /// # Errors
    ///
    /// An error here is treated as transient: the supervisor stays in
    /// `Polling` and retries on the next scheduled tick.
    async fn poll(&self, handle: &Self::Handle)
        -> TaskResult<TaskObservation<Self::Progress, Self::Output>>;

    /// Synthesize a terminal error payload from a failure message.
    ///
    /// Used when the start call fails, and when a terminal-error poll
    /// arrives without a result payload.
    fn error_output(message: &str) -> Self::Output;
}
