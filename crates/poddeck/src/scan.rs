//! Security-scan supervision.
//!
//! One start call yields a `scan_id`; status polls report the complete log
//! sequence plus, once terminal, an opaque result payload (vulnerability
//! summary or error object).

use api_types::ScanStatus;
use async_trait::async_trait;
use serde_json::{json, Value};
use task_poll::{PollTask, TaskError, TaskObservation, TaskPhase, TaskResult};

use crate::api::ApiClient;

/// [`PollTask`] for an image vulnerability scan of one pod.
pub struct ScanTask {
    client: ApiClient,
    server_id: String,
    pod_id: String,
}

impl ScanTask {
    pub fn new(client: ApiClient, server_id: impl Into<String>, pod_id: impl Into<String>) -> Self {
        Self {
            client,
            server_id: server_id.into(),
            pod_id: pod_id.into(),
        }
    }
}

#[async_trait]
impl PollTask for ScanTask {
    type Handle = String;
    type Progress = Vec<String>;
    type Output = Value;

    async fn start(&self) -> TaskResult<String> {
        match self.client.start_scan(&self.server_id, &self.pod_id).await {
            Ok(response) => Ok(response.scan_id),
            Err(report) => {
                // Keep the service's own text; it ends up in the result dialog.
                let message = report.current_context().to_string();
                Err(report.change_context(TaskError::Start { message }))
            }
        }
    }

    async fn poll(&self, scan_id: &String) -> TaskResult<TaskObservation<Vec<String>, Value>> {
        let status = self
            .client
            .scan_status(scan_id)
            .await
            .map_err(|report| {
                let message = report.current_context().to_string();
                report.change_context(TaskError::Poll { message })
            })?;

        Ok(TaskObservation {
            phase: phase_for(status.status),
            progress: status.logs,
            result: status.result,
        })
    }

    fn error_output(message: &str) -> Value {
        json!({ "error": message })
    }
}

fn phase_for(status: ScanStatus) -> TaskPhase {
    match status {
        ScanStatus::Pending => TaskPhase::Pending,
        ScanStatus::Running => TaskPhase::Running,
        ScanStatus::Success => TaskPhase::Success,
        ScanStatus::Error => TaskPhase::Error,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use poem::listener::{Acceptor, Listener, TcpListener};
    use poem::web::{Data, Json, Query};
    use poem::{handler, EndpointExt, IntoResponse, Route, Server as PoemServer};
    use serde::Deserialize;
    use similar_asserts::assert_eq;
    use task_poll::{SupervisorConfig, TaskLifecycle, TaskOutcome, TaskSupervisor};

    use super::*;
    use crate::api::ApiConfig;

    #[derive(Clone)]
    struct MockScanner {
        polls: Arc<AtomicUsize>,
        accept_start: bool,
    }

    #[derive(Deserialize)]
    struct ScanQuery {
        server_id: String,
        pod_id: String,
    }

    #[handler]
    fn scan_handler(
        Query(query): Query<ScanQuery>,
        Data(scanner): Data<&MockScanner>,
    ) -> poem::Response {
        assert_eq!(query.server_id, "s1");
        assert_eq!(query.pod_id, "web");
        if !scanner.accept_start {
            return poem::Response::builder()
                .status(poem::http::StatusCode::NOT_FOUND)
                .body("Pod or Image URL not found");
        }
        Json(serde_json::json!({ "status": "accepted", "scan_id": "abc" })).into_response()
    }

    #[handler]
    fn status_handler(Data(scanner): Data<&MockScanner>) -> Json<serde_json::Value> {
        let poll = scanner.polls.fetch_add(1, Ordering::SeqCst);
        if poll == 0 {
            Json(serde_json::json!({ "status": "running", "logs": ["step1"] }))
        } else {
            Json(serde_json::json!({
                "status": "success",
                "logs": ["step1", "step2"],
                "result": { "vulnerabilities": 0 }
            }))
        }
    }

    async fn serve(scanner: MockScanner) -> String {
        let acceptor = TcpListener::bind("127.0.0.1:0")
            .into_acceptor()
            .await
            .expect("bind test listener");
        let addr = acceptor.local_addr().remove(0);
        let addr = addr.as_socket_addr().copied().expect("socket addr");
        let routes = Route::new()
            .at("/scan", scan_handler)
            .at("/scan/status", status_handler)
            .data(scanner);
        tokio::spawn(async move {
            let _ = PoemServer::new_with_acceptor(acceptor).run(routes).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn scan_reaches_success_with_result() {
        let scanner = MockScanner {
            polls: Arc::new(AtomicUsize::new(0)),
            accept_start: true,
        };
        let base = serve(scanner.clone()).await;
        let client = ApiClient::new(&ApiConfig::new(&base).with_request_timeout(Duration::from_secs(5)))
            .expect("client");

        let task = ScanTask::new(client, "s1", "web");
        let mut supervisor = TaskSupervisor::new(
            task,
            SupervisorConfig::new().with_poll_interval(Duration::from_millis(20)),
        );
        supervisor.begin();
        supervisor.finished().await;

        let view = supervisor.view().await;
        assert_eq!(view.lifecycle, TaskLifecycle::Terminal(TaskOutcome::Success));
        assert_eq!(view.progress, vec!["step1".to_string(), "step2".to_string()]);
        let result = view.result.expect("terminal result");
        assert_eq!(result["vulnerabilities"], 0);
        assert_eq!(scanner.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejected_start_becomes_terminal_error() {
        let scanner = MockScanner {
            polls: Arc::new(AtomicUsize::new(0)),
            accept_start: false,
        };
        let base = serve(scanner.clone()).await;
        let client = ApiClient::new(&ApiConfig::new(&base).with_request_timeout(Duration::from_secs(5)))
            .expect("client");

        let task = ScanTask::new(client, "s1", "web");
        let mut supervisor = TaskSupervisor::new(
            task,
            SupervisorConfig::new().with_poll_interval(Duration::from_millis(20)),
        );
        supervisor.begin();
        supervisor.finished().await;

        let view = supervisor.view().await;
        assert_eq!(view.lifecycle, TaskLifecycle::Terminal(TaskOutcome::Error));
        let result = view.result.expect("failure must carry a result");
        let message = result["error"].as_str().expect("error message");
        assert!(message.contains("Pod or Image URL not found"));
        // A rejected start never polls.
        assert_eq!(scanner.polls.load(Ordering::SeqCst), 0);
    }
}
