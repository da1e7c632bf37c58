//! Cooperative cancellation
//!
//! Two producers feed one cancellation source: OS signals (SIGINT, SIGTERM)
//! trip a token, and a caller-designated flag file is checked for existence.
//! The polling loop consumes the source once per iteration. The signal
//! listener holds no reference to the remote client, so a signal arriving
//! before the client exists simply leaves the token tripped.

use std::path::PathBuf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Why the job is being cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// SIGINT or SIGTERM delivered to the process
    Signal,
    /// The cancel-flag file appeared
    FlagFile(PathBuf),
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Signal => write!(f, "signal received"),
            CancelReason::FlagFile(path) => write!(f, "cancel flag {} found", path.display()),
        }
    }
}

/// Single source of cancellation requests
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    flag_path: Option<PathBuf>,
}

impl CancelSignal {
    /// Creates a source that also watches `flag_path`, if given
    pub fn new(flag_path: Option<PathBuf>) -> Self {
        Self {
            token: CancellationToken::new(),
            flag_path,
        }
    }

    /// Handle for producers that trip the source
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawns a task that trips the source on SIGINT or SIGTERM
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = wait_for_signal() => token.cancel(),
                () = token.cancelled() => {}
            }
        })
    }

    /// Checks both producers; never blocks
    ///
    /// The flag file is only observed, never deleted.
    pub fn check(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Signal);
        }
        match &self.flag_path {
            Some(path) if path.exists() => Some(CancelReason::FlagFile(path.clone())),
            _ => None,
        }
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, cancelling"),
        () = terminate => info!("Received SIGTERM, cancelling"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_requested() {
        let dir = tempfile::tempdir().unwrap();
        let signal = CancelSignal::new(Some(dir.path().join("cancel.flag")));
        assert_eq!(signal.check(), None);
    }

    #[test]
    fn test_flag_file_observed_and_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("cancel.flag");
        let signal = CancelSignal::new(Some(flag.clone()));

        std::fs::write(&flag, "").unwrap();
        assert_eq!(signal.check(), Some(CancelReason::FlagFile(flag.clone())));
        assert!(flag.exists());
    }

    #[test]
    fn test_token_producer() {
        let signal = CancelSignal::new(None);
        signal.token().cancel();
        assert_eq!(signal.check(), Some(CancelReason::Signal));
    }

    #[tokio::test]
    async fn test_listener_stops_when_token_tripped() {
        let signal = CancelSignal::new(None);
        let listener = signal.listen_for_signals();

        signal.token().cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), listener)
            .await
            .unwrap()
            .unwrap();
    }
}
