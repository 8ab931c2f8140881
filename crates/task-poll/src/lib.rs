//! Polling-based supervision of remote asynchronous tasks.
//!
//! This library abstracts the pattern where a long-running server-side
//! operation is launched by one call and then observed through repeated
//! status polling until it reaches a terminal outcome:
//!
//! - One start call yields an opaque task handle
//! - Status polls on a fixed cadence report phase, progress and result
//! - Progress payloads are complete replacements, never deltas
//! - Cancellation stops polling without touching the server-side task
//!
//! # Examples
//!
//! ```no_run
//! # use async_trait::async_trait;
//! # use task_poll::{PollTask, SupervisorConfig, TaskObservation, TaskPhase,
//! #     TaskResult, TaskSupervisor};
//! #
//! struct Build;
//!
//! #[async_trait]
//! impl PollTask for Build {
//!     type Handle = String;
//!     type Progress = Vec<String>;
//!     type Output = String;
//!
//!     async fn start(&self) -> TaskResult<String> {
//!         Ok("build-17".to_string())
//!     }
//!
//!     async fn poll(
//!         &self,
//!         _handle: &String,
//!     ) -> TaskResult<TaskObservation<Vec<String>, String>> {
//!         Ok(TaskObservation {
//!             phase: TaskPhase::Running,
//!             progress: vec!["compiling".to_string()],
//!             result: None,
//!         })
//!     }
//!
//!     fn error_output(message: &str) -> String {
//!         message.to_string()
//!     }
//! }
//!
//! # async fn run() {
//! let mut supervisor = TaskSupervisor::new(Build, SupervisorConfig::new());
//! supervisor.begin();
//! let view = supervisor.view().await;
//! supervisor.cancel();
//! # }
//! ```

pub mod config;
pub mod error;
pub mod supervisor;
pub mod types;

pub use config::SupervisorConfig;
pub use error::TaskError;
pub use error::TaskResult;
pub use supervisor::TaskSupervisor;
pub use types::PollTask;
pub use types::TaskLifecycle;
pub use types::TaskObservation;
pub use types::TaskOutcome;
pub use types::TaskPhase;
pub use types::TaskView;
