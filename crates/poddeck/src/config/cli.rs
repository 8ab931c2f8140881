use clap::{Parser, Subcommand};

use crate::config::args::{DashArgs, SnapshotArgs};

#[derive(Parser)]
#[command(about = "Terminal dashboard for a pod fleet", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive dashboard
    Dash(DashArgs),
    /// Fetch one cluster snapshot and print it as JSON
    Snapshot(SnapshotArgs),
}
