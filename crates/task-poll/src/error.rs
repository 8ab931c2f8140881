//! Error types for task supervision.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for supervision operations.
pub type TaskResult<T> = Result<T, Report<TaskError>>;

/// Errors that can occur while driving a polled task.
#[derive(Debug, Display)]
pub enum TaskError {
    /// The start call was rejected or failed
    #[display("Start error: {message}")]
    Start { message: String },

    /// A status poll failed before yielding a status-bearing response
    #[display("Poll error: {message}")]
    Poll { message: String },
}

impl Error for TaskError {}
