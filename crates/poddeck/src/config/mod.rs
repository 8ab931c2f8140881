pub mod args;
pub mod cli;

pub use args::{DashArgs, SnapshotArgs};
pub use cli::{Cli, Commands};
