//! Log-tail supervision.
//!
//! A log tail has no terminal state: each poll replaces the buffer with the
//! complete current content, and the stream only ends when the owning view
//! cancels it. There is no server-side handle either; the target pod is
//! fixed at construction and every poll is a plain log fetch.

use async_trait::async_trait;
use task_poll::{PollTask, TaskError, TaskObservation, TaskPhase, TaskResult};

use crate::api::ApiClient;

/// [`PollTask`] that tails the logs of one pod.
pub struct LogTailTask {
    client: ApiClient,
    server_id: String,
    pod_id: String,
}

impl LogTailTask {
    pub fn new(client: ApiClient, server_id: impl Into<String>, pod_id: impl Into<String>) -> Self {
        Self {
            client,
            server_id: server_id.into(),
            pod_id: pod_id.into(),
        }
    }
}

#[async_trait]
impl PollTask for LogTailTask {
    type Handle = ();
    type Progress = String;
    type Output = String;

    async fn start(&self) -> TaskResult<()> {
        Ok(())
    }

    async fn poll(&self, _handle: &()) -> TaskResult<TaskObservation<String, String>> {
        let text = self
            .client
            .fetch_logs(&self.server_id, &self.pod_id)
            .await
            .map_err(|report| {
                let message = report.current_context().to_string();
                report.change_context(TaskError::Poll { message })
            })?;

        Ok(TaskObservation {
            phase: TaskPhase::Running,
            progress: text,
            result: None,
        })
    }

    fn error_output(message: &str) -> String {
        message.to_string()
    }
}
