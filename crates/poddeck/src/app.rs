use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::actions::Actions;
use crate::api::{ApiClient, ApiConfig};
use crate::config::DashArgs;
use crate::poller::{Poller, RefreshHandle};
use crate::state::DashboardState;

/// Application core structure, wiring the sync engine together.
pub struct Application {
    pub state: DashboardState,
    pub client: ApiClient,
    pub actions: Actions,
    pub refresh: RefreshHandle,
    pub args: DashArgs,
}

impl Application {
    /// Build the shared state, API client and poller from CLI args. The
    /// returned poller is handed to [`Tasks::spawn_poller`].
    pub fn new(args: DashArgs) -> Result<(Self, Poller)> {
        let config = ApiConfig::new(&args.api_url)
            .with_request_timeout(Duration::from_secs(args.request_timeout_secs));
        let client = ApiClient::new(&config)
            .map_err(|report| anyhow::anyhow!("failed to create API client: {report:?}"))?;

        let state = DashboardState::new();
        let (poller, refresh) = Poller::new(
            client.clone(),
            state.clone(),
            Duration::from_secs(args.refresh_interval_secs),
        );
        let actions = Actions::new(client.clone(), state.clone(), refresh.clone());

        let app = Self {
            state,
            client,
            actions,
            refresh,
            args,
        };
        Ok((app, poller))
    }
}

/// Task manager, responsible for starting and stopping background tasks.
pub struct Tasks {
    tasks: Vec<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl Default for Tasks {
    fn default() -> Self {
        Self::new()
    }
}

impl Tasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn spawn_poller(&mut self, poller: Poller) {
        let token = self.cancellation_token.clone();
        self.tasks.push(tokio::spawn(async move {
            tracing::info!("Starting cluster poller task");
            poller.run(token).await;
            tracing::info!("Cluster poller task completed");
        }));
    }

    /// Cancel every background task and wait for them to wind down.
    pub async fn shutdown(self) {
        self.cancellation_token.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}
