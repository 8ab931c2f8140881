//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// initiate the global tracing subscriber
///
/// With a log file, lines go through a non-blocking daily-rolling appender
/// (the dashboard owns the terminal); the returned guard must be held for
/// the life of the process so buffered lines flush on exit. Without one,
/// logs go to stderr.
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let Some(log_file) = log_file else {
        let fmt_layer = layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(env_filter);
        registry().with(fmt_layer).init();
        return None;
    };

    let parent = log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("poddeck.log");

    let (file_writer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(3)
        .build(parent)
    {
        Ok(appender) => tracing_appender::non_blocking(appender),
        Err(err) => {
            eprintln!(
                "failed to create rolling log appender at {}: {err}; falling back to stderr",
                parent.display()
            );
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    let fmt_layer = layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter);
    registry().with(fmt_layer).init();
    Some(guard)
}
