//! Job domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Literal written to the status flag when a job is cancelled
pub const CANCELLATION_MARKER: &str = "CANCELLED";

/// Remote operations the client knows how to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch the model's control list and card
    FetchControls,
    /// Run the model on positional control values
    Process,
    /// Ask the service to cancel outstanding work
    Cancel,
}

impl Operation {
    /// Endpoint names the operation may be published under, preferred first
    ///
    /// Older HARP apps publish `wav2wav-ctrls` and `wav2wav`.
    pub fn endpoint_names(&self) -> &'static [&'static str] {
        match self {
            Operation::FetchControls => &["/controls", "/wav2wav-ctrls"],
            Operation::Process => &["/process", "/wav2wav"],
            Operation::Cancel => &["/cancel", "/wav2wav-cancel"],
        }
    }

    /// Whether a service lacking this operation is still usable
    pub fn is_optional(&self) -> bool {
        matches!(self, Operation::Cancel)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::FetchControls => "fetch-controls",
            Operation::Process => "process",
            Operation::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Job status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Submitted, result stream not yet open
    Pending,
    /// Result stream open, waiting for output
    Processing,
    /// Intermediate output received
    Iterating,
    Finished,
    Failed,
    Cancelled,
}

impl StatusCode {
    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatusCode::Finished | StatusCode::Failed | StatusCode::Cancelled
        )
    }

    /// Plain-text form persisted to status flag files
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Pending => "PENDING",
            StatusCode::Processing => "PROCESSING",
            StatusCode::Iterating => "ITERATING",
            StatusCode::Finished => "FINISHED",
            StatusCode::Failed => "FAILED",
            StatusCode::Cancelled => CANCELLATION_MARKER,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured status of a remote job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub code: StatusCode,
    pub message: Option<String>,
}

impl JobStatus {
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn with_message(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.code.is_terminal()
    }

    /// Moves to `next` unless already terminal
    ///
    /// Returns `true` if the status changed.
    pub fn advance(&mut self, next: JobStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        *self = next;
        true
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::new(StatusCode::Pending)
    }
}

/// Result of a completed job
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    /// A file downloaded to the local filesystem
    File(PathBuf),
    /// Structured data, e.g. a controls response
    Data(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status_never_reverts() {
        let mut status = JobStatus::default();
        assert!(status.advance(JobStatus::new(StatusCode::Processing)));
        assert!(status.advance(JobStatus::new(StatusCode::Finished)));
        assert!(!status.advance(JobStatus::new(StatusCode::Processing)));
        assert_eq!(status.code, StatusCode::Finished);
    }

    #[test]
    fn test_advance_ignores_identical_status() {
        let mut status = JobStatus::new(StatusCode::Processing);
        assert!(!status.advance(JobStatus::new(StatusCode::Processing)));
    }

    #[test]
    fn test_status_code_text() {
        assert_eq!(StatusCode::Processing.to_string(), "PROCESSING");
        assert_eq!(StatusCode::Cancelled.as_str(), CANCELLATION_MARKER);
        let json = serde_json::to_string(&StatusCode::Iterating).unwrap();
        assert_eq!(json, "\"ITERATING\"");
    }

    #[test]
    fn test_operation_endpoint_names() {
        assert_eq!(Operation::Process.endpoint_names()[0], "/process");
        assert!(Operation::FetchControls
            .endpoint_names()
            .contains(&"/wav2wav-ctrls"));
        assert!(Operation::Cancel.is_optional());
        assert!(Operation::Cancel
            .endpoint_names()
            .contains(&"/wav2wav-cancel"));
        assert!(!Operation::Process.is_optional());
        assert_eq!(Operation::FetchControls.to_string(), "fetch-controls");
    }
}
