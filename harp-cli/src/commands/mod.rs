//! Commands module
//!
//! One handler per mode. Both submit a single job, poll it, and either
//! deliver its result or stop early.

mod controls;
mod process;

use harp_client::{Job, RemoteClient};
use harp_core::domain::job::{JobOutput, StatusCode};
use std::path::PathBuf;
use tracing::error;

use crate::config::{Config, Mode};
use crate::error::RunError;
use crate::output;

/// How an invocation ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The result was written to this path
    Completed(PathBuf),
    /// The job was cancelled; nothing was written
    Cancelled,
}

/// Run the configured mode
///
/// # Arguments
/// * `config` - A validated configuration
pub async fn handle_mode(config: &Config) -> Result<Outcome, RunError> {
    match config.mode {
        Mode::Controls => controls::fetch_controls(config).await,
        Mode::Process => process::run_process(config).await,
    }
}

/// Connect to the configured service
async fn connect(config: &Config) -> Result<RemoteClient, RunError> {
    Ok(RemoteClient::connect_with(&config.url, config.connect_options()).await?)
}

/// Fetch a finished job's result, failing the status flag on error
async fn fetch(client: &RemoteClient, job: Job, config: &Config) -> Result<JobOutput, RunError> {
    match client.fetch_result(job).await {
        Ok(output) => Ok(output),
        Err(e) => {
            error!("Job failed: {}", e);
            if let Some(flag) = config.status_flag() {
                flag.write_status(StatusCode::Failed).await;
            }
            Err(e.into())
        }
    }
}

/// Write the result to the output path and record completion
async fn deliver(output: JobOutput, config: &Config) -> Result<Outcome, RunError> {
    output::deliver(output, &config.output_path).await?;
    if let Some(flag) = config.status_flag() {
        flag.write_status(StatusCode::Finished).await;
    }
    Ok(Outcome::Completed(config.output_path.clone()))
}
