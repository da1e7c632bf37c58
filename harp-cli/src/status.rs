//! Status flag file
//!
//! External observers (plugin hosts, scripts) read the job's progress from a
//! plain-text file. Writes are best-effort and overwrite the previous value.

use harp_core::domain::job::{CANCELLATION_MARKER, StatusCode};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Status flag at a caller-chosen path
#[derive(Debug, Clone)]
pub struct StatusFlag {
    path: PathBuf,
}

impl StatusFlag {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a status code
    pub async fn write_status(&self, code: StatusCode) {
        self.write(code.as_str()).await;
    }

    /// Persist the cancellation marker
    pub async fn write_cancelled(&self) {
        self.write(CANCELLATION_MARKER).await;
    }

    async fn write(&self, text: &str) {
        if let Err(e) = tokio::fs::write(&self.path, text).await {
            warn!(
                "Failed to write status flag {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
