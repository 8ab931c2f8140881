//! The supervisor state machine.
//!
//! One spawned driver task walks the lifecycle; readers observe it through
//! cloned [`TaskView`] snapshots. Cancellation runs through a
//! [`CancellationToken`], so a cancel deterministically drops any scheduled
//! sleep or in-flight poll at the driver's `select!`; a cancelled
//! supervisor never mutates state again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::config::SupervisorConfig;
use crate::types::PollTask;
use crate::types::TaskLifecycle;
use crate::types::TaskOutcome;
use crate::types::TaskPhase;
use crate::types::TaskView;

/// Drives one remote task from start to a terminal state, or until
/// cancelled.
pub struct TaskSupervisor<T: PollTask> {
    task: Option<T>,
    config: SupervisorConfig,
    view: Arc<RwLock<TaskView<T::Progress, T::Output>>>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl<T: PollTask> TaskSupervisor<T> {
    /// Create an idle supervisor. Nothing happens until [`begin`].
    ///
    /// [`begin`]: TaskSupervisor::begin
    pub fn new(task: T, config: SupervisorConfig) -> Self {
        Self {
            task: Some(task),
            config,
            view: Arc::new(RwLock::new(TaskView::default())),
            cancel: CancellationToken::new(),
            driver: None,
        }
    }

    /// Start the task and begin polling.
    ///
    /// Transitions `Idle → Starting` and spawns the driver. If the start
    /// call fails the driver transitions straight to `Terminal(Error)` with
    /// the failure message as result and never polls. Calling `begin` a
    /// second time is a no-op.
    pub fn begin(&mut self) {
        let Some(task) = self.task.take() else {
            warn!("begin() called on a supervisor that already started");
            return;
        };

        let view = Arc::clone(&self.view);
        let token = self.cancel.clone();
        let poll_interval = self.config.poll_interval;
        self.driver = Some(tokio::spawn(drive(task, view, token, poll_interval)));
    }

    /// Current snapshot of the task.
    pub async fn view(&self) -> TaskView<T::Progress, T::Output> {
        self.view.read().await.clone()
    }

    /// Stop polling.
    ///
    /// Idempotent, valid from `Starting` or `Polling`; a supervisor that
    /// already reached a terminal state is unaffected. No remote abort
    /// endpoint is called; the server-side task, if any, continues
    /// untracked.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the driver task to settle. Shutdown/test helper; the driver
    /// does not need to be awaited for cancellation to take effect.
    pub async fn finished(&mut self) {
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }
}

impl<T: PollTask> Drop for TaskSupervisor<T> {
    fn drop(&mut self) {
        // A dropped supervisor must not leave a polling driver behind.
        self.cancel.cancel();
    }
}

async fn drive<T: PollTask>(
    task: T,
    view: Arc<RwLock<TaskView<T::Progress, T::Output>>>,
    token: CancellationToken,
    poll_interval: Duration,
) {
    view.write().await.lifecycle = TaskLifecycle::Starting;

    let handle = tokio::select! {
        _ = token.cancelled() => {
            view.write().await.lifecycle = TaskLifecycle::Cancelled;
            debug!("task cancelled before start completed");
            return;
        }
        started = task.start() => match started {
            Ok(handle) => handle,
            Err(report) => {
                warn!("task start failed: {report:?}");
                let mut view = view.write().await;
                view.result = Some(T::error_output(&report.to_string()));
                view.lifecycle = TaskLifecycle::Terminal(TaskOutcome::Error);
                return;
            }
        }
    };

    debug!(handle = ?handle, "task started, polling");
    view.write().await.lifecycle = TaskLifecycle::Polling;

    loop {
        let observed = tokio::select! {
            _ = token.cancelled() => {
                view.write().await.lifecycle = TaskLifecycle::Cancelled;
                debug!("task cancelled, polling stopped");
                return;
            }
            observed = async {
                tokio::time::sleep(poll_interval).await;
                task.poll(&handle).await
            } => observed,
        };

        let observation = match observed {
            Ok(observation) => observation,
            Err(report) => {
                // Transient transport failure; the task itself is unaffected.
                warn!("status poll failed, retrying next tick: {report:?}");
                continue;
            }
        };

        let mut view = view.write().await;
        view.progress = observation.progress;

        match observation.phase {
            TaskPhase::Pending | TaskPhase::Running => {}
            TaskPhase::Success => {
                view.result = observation.result;
                view.lifecycle = TaskLifecycle::Terminal(TaskOutcome::Success);
                return;
            }
            TaskPhase::Error => {
                // Guard against a malformed terminal response without a payload.
                view.result = observation
                    .result
                    .or_else(|| Some(T::error_output("Unknown error")));
                view.lifecycle = TaskLifecycle::Terminal(TaskOutcome::Error);
                return;
            }
        }
    }
}
