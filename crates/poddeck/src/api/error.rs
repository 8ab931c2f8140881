//! Error types for the fleet service client.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for fleet service calls.
pub type ApiResult<T> = Result<T, Report<ApiError>>;

/// Errors that can occur while talking to the fleet service.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Network connectivity issues
    #[display("Network error: {message}")]
    Network { message: String },

    /// Non-2xx response; `message` is the opaque error text from the service
    #[display("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Serialization/deserialization errors
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// Client configuration errors
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error for ApiError {}

impl ApiError {
    /// An application-level rejection (status-bearing response), as opposed
    /// to a transport failure. Rejections are surfaced to the user once;
    /// everything else is retried silently on the next scheduled tick.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Http { .. })
    }
}
