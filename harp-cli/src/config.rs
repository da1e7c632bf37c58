//! Configuration module
//!
//! Settings for one invocation, built from command-line arguments and
//! validated before any I/O happens.

use clap::ValueEnum;
use harp_client::ConnectOptions;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RunError;
use crate::status::StatusFlag;

/// What the invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Fetch the model's controls and card
    #[value(alias = "get_ctrls")]
    Controls,
    /// Run the model on a controls file
    #[value(alias = "predict")]
    Process,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL or space address of the remote app
    pub url: String,

    /// Where the result is written
    pub output_path: PathBuf,

    pub mode: Mode,

    /// JSON list of positional control values (process mode)
    pub ctrls_path: Option<PathBuf>,

    /// Cancel once this file exists (process mode)
    pub cancel_flag_path: Option<PathBuf>,

    /// Receives the job status code, or the cancellation marker
    pub status_flag_path: Option<PathBuf>,

    /// Deadline for fetching controls
    pub ctrls_timeout: Duration,

    /// Sleep between polls
    pub poll_interval: Duration,

    /// Timeout for short HTTP requests
    pub request_timeout: Duration,

    /// Where downloaded results land before being moved
    pub download_dir: PathBuf,
}

impl Config {
    /// Creates a configuration with defaults
    pub fn new(url: impl Into<String>, output_path: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            mode,
            ctrls_path: None,
            cancel_flag_path: None,
            status_flag_path: None,
            ctrls_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
            request_timeout: Duration::from_secs(30),
            download_dir: ConnectOptions::default().download_dir,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), RunError> {
        if self.url.trim().is_empty() {
            return Err(RunError::Configuration(
                "Please specify a url to connect to".to_string(),
            ));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(RunError::Configuration(
                "Please specify an output path".to_string(),
            ));
        }

        if self.mode == Mode::Process && self.ctrls_path.is_none() {
            return Err(RunError::Configuration(
                "Please specify a ctrls path (--ctrls_path) in process mode".to_string(),
            ));
        }

        if self.ctrls_timeout.is_zero() {
            return Err(RunError::Configuration(
                "ctrls_timeout must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(RunError::Configuration(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(RunError::Configuration(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Options for connecting the remote client
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            request_timeout: self.request_timeout,
            download_dir: self.download_dir.clone(),
        }
    }

    pub fn status_flag(&self) -> Option<StatusFlag> {
        self.status_flag_path.clone().map(StatusFlag::new)
    }
}

/// Converts a seconds argument into a duration
pub fn seconds(name: &str, value: f64) -> Result<Duration, RunError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        RunError::Configuration(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        ))
    })
}
