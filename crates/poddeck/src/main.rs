mod actions;
mod api;
mod app;
mod config;
mod logging;
mod logtail;
mod poller;
mod reconciler;
mod scan;
mod state;
mod tui;

use anyhow::Result;
use clap::Parser;

use crate::api::{ApiClient, ApiConfig};
use crate::app::{Application, Tasks};
use crate::config::{Cli, Commands, DashArgs, SnapshotArgs};

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dash(dash_args) => run_dash(dash_args).await,
        Commands::Snapshot(snapshot_args) => run_snapshot(snapshot_args).await,
    }
}

async fn run_dash(dash_args: DashArgs) -> Result<()> {
    let _guard = logging::init(dash_args.log_file.as_deref());

    tracing::info!(api_url = %dash_args.api_url, "Starting poddeck dashboard");

    let (app, poller) = Application::new(dash_args)?;
    let mut tasks = Tasks::new();
    tasks.spawn_poller(poller);

    let result = tui::run_dashboard(&app).await;

    tasks.shutdown().await;
    tracing::info!("Dashboard shut down");
    result
}

async fn run_snapshot(snapshot_args: SnapshotArgs) -> Result<()> {
    let _guard = logging::init(None);

    let config = ApiConfig::new(&snapshot_args.api_url).with_request_timeout(
        std::time::Duration::from_secs(snapshot_args.request_timeout_secs),
    );
    let client = ApiClient::new(&config)
        .map_err(|report| anyhow::anyhow!("failed to create API client: {report:?}"))?;

    let servers = client
        .list_servers()
        .await
        .map_err(|report| anyhow::anyhow!("snapshot fetch failed: {report:?}"))?;

    println!("{}", serde_json::to_string_pretty(&servers)?);
    Ok(())
}
