//! Error types for a CLI invocation

use harp_client::ClientError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end an invocation with a nonzero exit
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing argument, malformed controls file, parameter count mismatch
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Controls did not arrive before the deadline
    #[error("Timed out after {0:?} waiting for controls")]
    Timeout(Duration),

    /// Connection or remote job failure
    #[error(transparent)]
    Client(ClientError),

    /// Writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for RunError {
    fn from(err: ClientError) -> Self {
        if err.is_caller_error() {
            RunError::Configuration(err.to_string())
        } else {
            RunError::Client(err)
        }
    }
}
