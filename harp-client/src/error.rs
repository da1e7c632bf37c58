//! Error types for the HARP client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the HARP client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Service unreachable or not a HARP app
    #[error("Cannot connect to {url}: {message}")]
    Connection { url: String, message: String },

    /// Space address in none of the accepted forms
    #[error("Invalid space address: {0}")]
    InvalidUrl(String),

    /// Service does not expose a required operation
    #[error("Service does not expose the {0} operation")]
    MissingEndpoint(String),

    /// Positional arguments do not line up with the endpoint's parameters
    #[error("Endpoint {endpoint} declares {expected} parameter(s) but {actual} were given")]
    ArgumentMismatch {
        endpoint: String,
        expected: usize,
        actual: usize,
    },

    /// Argument unusable for its declared parameter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Remote side reported a failure
    #[error("Remote job failed: {0}")]
    JobFailed(String),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create a connection error for `url`
    pub fn connection(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error means the service could not be used at all
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::MissingEndpoint(_))
    }

    /// Check if this error was caused by the caller's input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::ArgumentMismatch { .. } | Self::InvalidArgument(_)
        )
    }
}
