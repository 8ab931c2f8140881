//! One-shot mutating actions against the fleet service.
//!
//! Each action is a single request/response round trip, not a state
//! machine. A success triggers an immediate out-of-band poller tick; the
//! authoritative state change arrives with a later snapshot. A failure
//! hands the service's error text back to the caller, which surfaces it
//! once as a blocking notification with no automatic retry.

use api_types::{CreatePodRequest, DeletePodRequest, UpdatePodRequest};
use tracing::info;

use crate::api::{ApiClient, ApiResult};
use crate::poller::RefreshHandle;
use crate::state::DashboardState;

#[derive(Debug, Clone)]
pub struct Actions {
    client: ApiClient,
    state: DashboardState,
    refresh: RefreshHandle,
}

impl Actions {
    pub fn new(client: ApiClient, state: DashboardState, refresh: RefreshHandle) -> Self {
        Self {
            client,
            state,
            refresh,
        }
    }

    /// Submit a new pod spec.
    ///
    /// The created pod typically still shows a non-terminal status until a
    /// later snapshot reflects completion; that is expected, not an error.
    pub async fn create_pod(&self, request: CreatePodRequest) -> ApiResult<()> {
        self.client.create_pod(&request).await?;
        info!(server_id = %request.server_id, pod_id = %request.pod_id, "pod created");
        self.refresh.request();
        Ok(())
    }

    /// Submit a target image for an existing pod.
    ///
    /// Callers must require explicit confirmation before submitting. The
    /// pod's transient edit is cleared only after the service accepts the
    /// update; on failure the typed value stays in place.
    pub async fn update_pod(&self, request: UpdatePodRequest) -> ApiResult<()> {
        self.client.update_pod(&request).await?;
        self.state
            .clear_editing_image(&request.server_id, &request.pod_id)
            .await;
        info!(
            server_id = %request.server_id,
            pod_id = %request.pod_id,
            image_url = %request.image_url,
            "pod image updated"
        );
        self.refresh.request();
        Ok(())
    }

    /// Remove a pod by identity. Absence from the next snapshot is the only
    /// deletion confirmation.
    pub async fn delete_pod(&self, request: DeletePodRequest) -> ApiResult<()> {
        self.client.delete_pod(&request).await?;
        info!(server_id = %request.server_id, pod_id = %request.pod_id, "pod deleted");
        self.refresh.request();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use api_types::RequestedResources;
    use poem::listener::{Acceptor, Listener, TcpListener};
    use poem::web::Data;
    use poem::{handler, EndpointExt, Route, Server as PoemServer};

    use super::*;
    use crate::api::ApiConfig;
    use crate::poller::Poller;

    #[derive(Clone)]
    struct MockFleet {
        accept: Arc<AtomicBool>,
    }

    #[handler]
    fn mutate_handler(Data(fleet): Data<&MockFleet>) -> poem::Response {
        if fleet.accept.load(Ordering::SeqCst) {
            poem::Response::builder().body("{}")
        } else {
            poem::Response::builder()
                .status(poem::http::StatusCode::INTERNAL_SERVER_ERROR)
                .body("Pod not found on server")
        }
    }

    async fn serve(fleet: MockFleet) -> String {
        let acceptor = TcpListener::bind("127.0.0.1:0")
            .into_acceptor()
            .await
            .expect("bind test listener");
        let addr = acceptor.local_addr().remove(0);
        let addr = addr.as_socket_addr().copied().expect("socket addr");
        let routes = Route::new()
            .at("/create", poem::post(mutate_handler))
            .at("/update", poem::post(mutate_handler))
            .at("/delete", poem::post(mutate_handler))
            .data(fleet);
        tokio::spawn(async move {
            let _ = PoemServer::new_with_acceptor(acceptor).run(routes).await;
        });
        format!("http://{addr}")
    }

    async fn actions_for(base: &str, state: DashboardState) -> (Actions, Poller) {
        let client = ApiClient::new(&ApiConfig::new(base).with_request_timeout(Duration::from_secs(5)))
            .expect("client");
        let (poller, refresh) = Poller::new(client.clone(), state.clone(), Duration::from_secs(3600));
        (Actions::new(client, state, refresh), poller)
    }

    fn create_request() -> CreatePodRequest {
        CreatePodRequest {
            server_id: "s1".into(),
            pod_id: "web".into(),
            image_url: "nginx:latest".into(),
            namespace: None,
            route: None,
            requested: RequestedResources {
                cpus: 0.5,
                ram_gb: 0.5,
                storage_gb: 1.0,
            },
        }
    }

    #[tokio::test]
    async fn successful_create_requests_a_refresh() {
        let fleet = MockFleet {
            accept: Arc::new(AtomicBool::new(true)),
        };
        let base = serve(fleet).await;
        let state = DashboardState::new();
        let (actions, mut poller) = actions_for(&base, state).await;

        actions.create_pod(create_request()).await.expect("create");

        // The out-of-band tick is queued for the poller.
        let queued = poller.refresh_rx.try_recv();
        assert!(queued.is_ok());
    }

    #[tokio::test]
    async fn failed_action_surfaces_error_text_without_refresh() {
        let fleet = MockFleet {
            accept: Arc::new(AtomicBool::new(false)),
        };
        let base = serve(fleet).await;
        let state = DashboardState::new();
        let (actions, mut poller) = actions_for(&base, state).await;

        let report = actions
            .delete_pod(DeletePodRequest {
                server_id: "s1".into(),
                pod_id: "ghost".into(),
            })
            .await
            .expect_err("delete must fail");

        assert!(report.current_context().is_rejection());
        assert!(report
            .current_context()
            .to_string()
            .contains("Pod not found on server"));
        assert!(poller.refresh_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successful_update_clears_the_transient_edit() {
        let fleet = MockFleet {
            accept: Arc::new(AtomicBool::new(true)),
        };
        let base = serve(fleet).await;
        let state = DashboardState::new();

        // Seed a snapshot with a pending edit.
        let snapshot: Vec<api_types::Server> = serde_json::from_value(serde_json::json!([{
            "id": "s1",
            "resources": {
                "cpu": {"allocated": 1.0, "total": 8.0, "unit": "cores"},
                "ram": {"allocated": 2.0, "total": 16.0, "unit": "GB"},
                "storage": {"allocated": 5.0, "total": 100.0, "unit": "GB"}
            },
            "pods": [{
                "pod_id": "web",
                "image_url": "nginx:1.0",
                "requested": {"cpus": 0.5, "ram_gb": 0.5, "storage_gb": 1.0},
                "status": "running"
            }]
        }]))
        .expect("snapshot");
        state.apply_snapshot(snapshot).await;
        state.select_server(Some("s1".to_string())).await;
        state.set_editing_image("s1", "web", "nginx:2.0").await;

        let (actions, _poller) = actions_for(&base, state.clone()).await;
        actions
            .update_pod(UpdatePodRequest {
                server_id: "s1".into(),
                pod_id: "web".into(),
                image_url: "nginx:2.0".into(),
            })
            .await
            .expect("update");

        let server = state.selected_server().await.expect("selected");
        assert_eq!(server.pods[0].editing_image, None);
    }
}
