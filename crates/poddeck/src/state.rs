//! Owned application state shared between the sync engine and the view.
//!
//! All mutation goes through these methods; a merge runs under a single
//! write lock with complete local and incoming snapshots, so readers only
//! ever observe fully applied state. The presentation layer reads one-way.

use std::sync::Arc;

use api_types::Server;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::reconciler;

/// Cloneable handle to the dashboard state.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    inner: Arc<RwLock<StateInner>>,
}

#[derive(Debug, Default)]
struct StateInner {
    servers: Vec<Server>,
    selected: Option<String>,
    last_refresh: Option<DateTime<Utc>>,
    last_refresh_error: Option<String>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile an incoming snapshot into the local one and install the
    /// result. Clears any recorded refresh error.
    pub async fn apply_snapshot(&self, incoming: Vec<Server>) {
        let mut inner = self.inner.write().await;
        let selected = inner.selected.clone();
        inner.servers = reconciler::merge_snapshot(&inner.servers, incoming, selected.as_deref());
        inner.last_refresh = Some(Utc::now());
        inner.last_refresh_error = None;
    }

    /// Record a failed refresh. The current snapshot is left untouched.
    pub async fn record_refresh_error(&self, message: impl Into<String>) {
        self.inner.write().await.last_refresh_error = Some(message.into());
    }

    /// Complete current snapshot.
    pub async fn servers(&self) -> Vec<Server> {
        self.inner.read().await.servers.clone()
    }

    /// Select a server, or clear the selection with `None`. Independent of
    /// the refresh cycle.
    pub async fn select_server(&self, id: Option<String>) {
        self.inner.write().await.selected = id;
    }

    pub async fn selected_server_id(&self) -> Option<String> {
        self.inner.read().await.selected.clone()
    }

    /// The selected server as of the current snapshot, if it still exists.
    pub async fn selected_server(&self) -> Option<Server> {
        let inner = self.inner.read().await;
        let selected = inner.selected.as_deref()?;
        inner
            .servers
            .iter()
            .find(|server| server.id == selected)
            .cloned()
    }

    /// Set or replace the transient image edit on a pod. Returns false when
    /// the pod does not exist in the current snapshot.
    pub async fn set_editing_image(
        &self,
        server_id: &str,
        pod_id: &str,
        value: impl Into<String>,
    ) -> bool {
        let mut inner = self.inner.write().await;
        let Some(pod) = inner
            .servers
            .iter_mut()
            .find(|server| server.id == server_id)
            .and_then(|server| server.pods.iter_mut().find(|pod| pod.pod_id == pod_id))
        else {
            return false;
        };
        pod.editing_image = Some(value.into());
        true
    }

    /// Drop the transient image edit, e.g. after a successful update.
    pub async fn clear_editing_image(&self, server_id: &str, pod_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(pod) = inner
            .servers
            .iter_mut()
            .find(|server| server.id == server_id)
            .and_then(|server| server.pods.iter_mut().find(|pod| pod.pod_id == pod_id))
        {
            pod.editing_image = None;
        }
    }

    /// Instant of the last successful refresh; `None` until the first one
    /// lands (the view shows a loading indicator meanwhile).
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    /// Message of the most recent failed refresh, cleared by the next
    /// successful one.
    pub async fn last_refresh_error(&self) -> Option<String> {
        self.inner.read().await.last_refresh_error.clone()
    }
}
