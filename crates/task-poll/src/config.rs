//! supervisor config
//!
//! Shared by every supervised task kind; only the cadence differs between
//! instantiations.

use std::time::Duration;

/// Poll cadence for a task supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// interval between status polls; the first poll fires one interval
    /// after a successful start
    pub poll_interval: Duration,
}

impl SupervisorConfig {
    /// create a new config with default parameters.
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }

    /// set poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}
