//! Periodic cluster refresh.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::state::DashboardState;

/// Handle for requesting an immediate out-of-band refresh, e.g. right after
/// a successful mutating action.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Request a refresh. Best effort and non-blocking: when the queue is
    /// full a refresh is already pending, which is all we need.
    pub fn request(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Owns the refresh timer and feeds snapshots to the reconciler.
pub struct Poller {
    client: ApiClient,
    state: DashboardState,
    refresh_interval: Duration,
    pub(crate) refresh_rx: mpsc::Receiver<()>,
}

impl Poller {
    pub fn new(
        client: ApiClient,
        state: DashboardState,
        refresh_interval: Duration,
    ) -> (Self, RefreshHandle) {
        let (tx, rx) = mpsc::channel(8);
        (
            Self {
                client,
                state,
                refresh_interval,
                refresh_rx: rx,
            },
            RefreshHandle { tx },
        )
    }

    /// Issue one "list servers" fetch and reconcile the result.
    ///
    /// A failed fetch leaves the current snapshot untouched; transient
    /// network hiccups must never interrupt the dashboard.
    pub async fn refresh(&self) {
        match self.client.list_servers().await {
            Ok(snapshot) => {
                self.state.apply_snapshot(snapshot).await;
            }
            Err(report) => {
                let error = report.current_context();
                if error.is_rejection() {
                    warn!("fleet service rejected the refresh: {report:?}");
                } else {
                    warn!("cluster refresh failed: {report:?}");
                }
                self.state.record_refresh_error(error.to_string()).await;
            }
        }
    }

    /// Run until cancelled.
    ///
    /// The first fetch fires immediately; the fixed cadence starts after
    /// it. Refreshes are serialized: the loop awaits each one before
    /// selecting again, and the interval skips ticks that would overlap an
    /// in-flight refresh, so snapshots are applied monotonically.
    pub async fn run(mut self, token: CancellationToken) {
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("poller shutdown requested");
                    break;
                }
                _ = ticker.tick() => self.refresh().await,
                requested = self.refresh_rx.recv() => match requested {
                    Some(()) => {
                        debug!("out-of-band refresh requested");
                        self.refresh().await;
                    }
                    None => {
                        debug!("refresh channel closed");
                        break;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use poem::listener::{Acceptor, Listener, TcpListener};
    use poem::web::{Data, Json};
    use poem::{handler, EndpointExt, IntoResponse, Route, Server as PoemServer};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::api::ApiConfig;

    #[derive(Clone)]
    struct MockFleet {
        requests: Arc<AtomicUsize>,
        healthy: Arc<std::sync::atomic::AtomicBool>,
        delay: Duration,
    }

    #[handler]
    async fn servers_handler(Data(fleet): Data<&MockFleet>) -> poem::Response {
        let request = fleet.requests.fetch_add(1, Ordering::SeqCst);
        if !fleet.delay.is_zero() {
            tokio::time::sleep(fleet.delay).await;
        }
        if !fleet.healthy.load(Ordering::SeqCst) {
            return poem::Response::builder()
                .status(poem::http::StatusCode::INTERNAL_SERVER_ERROR)
                .body("fleet service unavailable");
        }
        // Pod count grows with every request so tests can tell snapshots apart.
        let pods: Vec<_> = (0..=request)
            .map(|index| {
                serde_json::json!({
                    "pod_id": format!("p{index}"),
                    "image_url": "nginx:1.0",
                    "requested": {"cpus": 0.5, "ram_gb": 0.5, "storage_gb": 1.0},
                    "status": "running"
                })
            })
            .collect();
        Json(serde_json::json!([{
            "id": "s1",
            "resources": {
                "cpu": {"allocated": 1.0, "total": 8.0, "unit": "cores"},
                "ram": {"allocated": 2.0, "total": 16.0, "unit": "GB"},
                "storage": {"allocated": 5.0, "total": 100.0, "unit": "GB"}
            },
            "pods": pods
        }]))
        .into_response()
    }

    async fn serve(fleet: MockFleet) -> String {
        let acceptor = TcpListener::bind("127.0.0.1:0")
            .into_acceptor()
            .await
            .expect("bind test listener");
        let addr = acceptor.local_addr().remove(0);
        let addr = addr.as_socket_addr().copied().expect("socket addr");
        let routes = Route::new().at("/servers", servers_handler).data(fleet);
        tokio::spawn(async move {
            let _ = PoemServer::new_with_acceptor(acceptor).run(routes).await;
        });
        format!("http://{addr}")
    }

    fn mock_fleet(delay: Duration) -> MockFleet {
        MockFleet {
            requests: Arc::new(AtomicUsize::new(0)),
            healthy: Arc::new(std::sync::atomic::AtomicBool::new(true)),
            delay,
        }
    }

    fn poller_for(base: &str, state: DashboardState, every: Duration) -> (Poller, RefreshHandle) {
        let client = ApiClient::new(&ApiConfig::new(base).with_request_timeout(Duration::from_secs(5)))
            .expect("client");
        Poller::new(client, state, every)
    }

    #[tokio::test]
    async fn refresh_applies_snapshot() {
        let fleet = mock_fleet(Duration::ZERO);
        let base = serve(fleet.clone()).await;
        let state = DashboardState::new();
        let (poller, _handle) = poller_for(&base, state.clone(), Duration::from_secs(9));

        poller.refresh().await;
        let servers = state.servers().await;
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].pods.len(), 1);
        assert!(state.last_refresh().await.is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let fleet = mock_fleet(Duration::ZERO);
        let base = serve(fleet.clone()).await;
        let state = DashboardState::new();
        let (poller, _handle) = poller_for(&base, state.clone(), Duration::from_secs(9));

        poller.refresh().await;
        assert_eq!(state.servers().await.len(), 1);

        fleet.healthy.store(false, Ordering::SeqCst);
        poller.refresh().await;

        // Old snapshot intact, error recorded for the status line only.
        assert_eq!(state.servers().await.len(), 1);
        let error = state.last_refresh_error().await.expect("error recorded");
        assert!(error.contains("fleet service unavailable"));
    }

    #[tokio::test]
    async fn manual_refresh_is_out_of_band() {
        let fleet = mock_fleet(Duration::ZERO);
        let base = serve(fleet.clone()).await;
        let state = DashboardState::new();
        // Cadence far beyond the test horizon: only the initial tick and the
        // manual request can fire.
        let (poller, handle) = poller_for(&base, state.clone(), Duration::from_secs(3600));

        let token = CancellationToken::new();
        let driver = tokio::spawn(poller.run(token.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fleet.requests.load(Ordering::SeqCst), 1);

        handle.request();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fleet.requests.load(Ordering::SeqCst), 2);

        token.cancel();
        driver.await.expect("poller task");
    }

    #[tokio::test]
    async fn overlapping_ticks_are_dropped() {
        // Each fetch takes ~80ms against a 20ms cadence. Serialized ticks
        // mean the request count tracks elapsed/fetch-time, not the cadence.
        let fleet = mock_fleet(Duration::from_millis(80));
        let base = serve(fleet.clone()).await;
        let state = DashboardState::new();
        let (poller, _handle) = poller_for(&base, state.clone(), Duration::from_millis(20));

        let token = CancellationToken::new();
        let driver = tokio::spawn(poller.run(token.clone()));
        tokio::time::sleep(Duration::from_millis(400)).await;
        token.cancel();
        driver.await.expect("poller task");

        let requests = fleet.requests.load(Ordering::SeqCst);
        assert!(requests >= 2, "expected some refreshes, got {requests}");
        assert!(
            requests <= 7,
            "ticks overlapped instead of being dropped: {requests} requests in 400ms"
        );
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let fleet = mock_fleet(Duration::ZERO);
        let base = serve(fleet.clone()).await;
        let state = DashboardState::new();
        let (poller, _handle) = poller_for(&base, state.clone(), Duration::from_millis(50));

        let token = CancellationToken::new();
        let driver = tokio::spawn(poller.run(token.clone()));
        tokio::time::sleep(Duration::from_millis(120)).await;
        token.cancel();
        driver.await.expect("poller task");

        let after_cancel = fleet.requests.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fleet.requests.load(Ordering::SeqCst), after_cancel);
    }
}
