use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
pub struct DashArgs {
    #[arg(
        long,
        env = "PODDECK_API_URL",
        default_value = "http://localhost:5006",
        help = "Base URL of the fleet service"
    )]
    pub api_url: String,

    #[arg(
        long,
        default_value = "9",
        help = "Seconds between cluster refreshes"
    )]
    pub refresh_interval_secs: u64,

    #[arg(
        long,
        default_value = "2",
        help = "Seconds between scan status polls while a scan dialog is open"
    )]
    pub scan_poll_interval_secs: u64,

    #[arg(
        long,
        default_value = "3",
        help = "Seconds between log fetches while a log view is open"
    )]
    pub log_poll_interval_secs: u64,

    #[arg(
        long,
        default_value = "30",
        help = "HTTP request timeout in seconds; image updates can take tens of seconds server-side"
    )]
    pub request_timeout_secs: u64,

    #[arg(
        long,
        env = "PODDECK_LOG_FILE",
        value_hint = clap::ValueHint::FilePath,
        help = "Write logs to this file (daily rotation); without it logs go to stderr, which the dashboard overdraws"
    )]
    pub log_file: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct SnapshotArgs {
    #[arg(
        long,
        env = "PODDECK_API_URL",
        default_value = "http://localhost:5006",
        help = "Base URL of the fleet service"
    )]
    pub api_url: String,

    #[arg(long, default_value = "30", help = "HTTP request timeout in seconds")]
    pub request_timeout_secs: u64,
}
