//! HARP CLI
//!
//! Runs one remote job against a HARP app: either fetches its controls or
//! processes a file with it, reporting progress through the filesystem.

mod cancel;
mod commands;
mod config;
mod error;
mod output;
mod poller;
mod status;

use anyhow::Result;
use clap::Parser;
use colored::*;
use commands::{Outcome, handle_mode};
use config::{Config, Mode};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "harp")]
#[command(about = "Run jobs on remote HARP apps", long_about = None)]
struct Cli {
    /// URL or space address of the app (e.g. `user/model`)
    #[arg(long, env = "HARP_URL")]
    url: String,

    /// Where the result is written
    #[arg(long = "output_path")]
    output_path: PathBuf,

    /// What to do
    #[arg(long, value_enum)]
    mode: Mode,

    /// JSON list of positional control values (process mode)
    #[arg(long = "ctrls_path")]
    ctrls_path: Option<PathBuf>,

    /// Cancel the job once this file exists (process mode)
    #[arg(long = "cancel_flag_path")]
    cancel_flag_path: Option<PathBuf>,

    /// File receiving the job status
    #[arg(long = "status_flag_path")]
    status_flag_path: Option<PathBuf>,

    /// Seconds to wait for controls before cancelling
    #[arg(long = "ctrls_timeout", default_value_t = 30.0)]
    ctrls_timeout: f64,

    /// Milliseconds between status polls
    #[arg(long = "poll_interval_ms", env = "HARP_POLL_INTERVAL_MS", default_value_t = 50)]
    poll_interval_ms: u64,

    /// Seconds allowed for each short HTTP request
    #[arg(long = "request_timeout", default_value_t = 30.0)]
    request_timeout: f64,

    /// Directory for downloaded results before they are moved
    #[arg(long = "download_dir", env = "HARP_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config, error::RunError> {
        let mut config = Config::new(self.url, self.output_path, self.mode);
        config.ctrls_path = self.ctrls_path;
        config.cancel_flag_path = self.cancel_flag_path;
        config.status_flag_path = self.status_flag_path;
        config.ctrls_timeout = config::seconds("ctrls_timeout", self.ctrls_timeout)?;
        config.poll_interval = Duration::from_millis(self.poll_interval_ms);
        config.request_timeout = config::seconds("request_timeout", self.request_timeout)?;
        if let Some(dir) = self.download_dir {
            config.download_dir = dir;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is left to the host
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harp_cli=info,harp_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Cli::parse().into_config()?;
    config.validate()?;

    info!("Running {:?} mode against {}", config.mode, config.url);

    match handle_mode(&config).await? {
        Outcome::Completed(path) => {
            println!("{} {}", "✓ Result written to".green(), path.display());
        }
        Outcome::Cancelled => {
            println!("{}", "⚠ Job cancelled, no result written".yellow());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_invocation() {
        let cli = Cli::try_parse_from([
            "harp",
            "--url",
            "hugggof/pitch_shifter",
            "--output_path",
            "out.wav",
            "--mode",
            "predict",
            "--ctrls_path",
            "ctrls.json",
            "--cancel_flag_path",
            "cancel.flag",
            "--ctrls_timeout",
            "2.5",
        ])
        .unwrap();

        let config = cli.into_config().unwrap();
        assert_eq!(config.mode, Mode::Process);
        assert_eq!(config.ctrls_path, Some(PathBuf::from("ctrls.json")));
        assert_eq!(config.cancel_flag_path, Some(PathBuf::from("cancel.flag")));
        assert_eq!(config.ctrls_timeout, Duration::from_millis(2500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_controls_defaults() {
        let cli = Cli::try_parse_from([
            "harp",
            "--url",
            "http://localhost:7860",
            "--output_path",
            "ctrls.json",
            "--mode",
            "get_ctrls",
        ])
        .unwrap();

        let config = cli.into_config().unwrap();
        assert_eq!(config.mode, Mode::Controls);
        assert_eq!(config.ctrls_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.status_flag_path.is_none());
    }

    #[test]
    fn test_output_path_is_required() {
        let result = Cli::try_parse_from([
            "harp",
            "--url",
            "http://localhost:7860",
            "--mode",
            "controls",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let cli = Cli::try_parse_from([
            "harp",
            "--url",
            "http://localhost:7860",
            "--output_path",
            "ctrls.json",
            "--mode",
            "controls",
            "--ctrls_timeout=-1",
        ])
        .unwrap();

        assert!(cli.into_config().is_err());
    }
}
