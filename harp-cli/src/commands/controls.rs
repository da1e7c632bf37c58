//! Controls mode
//!
//! Fetches the model's controls and card and writes them as JSON.

use harp_core::domain::control::ControlsResponse;
use harp_core::domain::job::{JobOutput, Operation};
use tracing::{info, warn};

use super::{Outcome, connect, deliver, fetch};
use crate::config::Config;
use crate::error::RunError;
use crate::poller::{JobPoller, PollOutcome};

/// Fetch controls, giving up after `ctrls_timeout`
pub async fn fetch_controls(config: &Config) -> Result<Outcome, RunError> {
    let client = connect(config).await?;
    let job = client.submit(Operation::FetchControls, Vec::new()).await?;

    let outcome = JobPoller::new(&client, config.poll_interval)
        .with_timeout(config.ctrls_timeout)
        .with_status_flag(config.status_flag())
        .run(&job)
        .await;

    match outcome {
        PollOutcome::Completed => {}
        PollOutcome::TimedOut(limit) => return Err(RunError::Timeout(limit)),
        PollOutcome::Cancelled(_) => return Ok(Outcome::Cancelled),
    }

    let output = fetch(&client, job, config).await?;
    if let JobOutput::Data(value) = &output {
        describe(value);
    }
    deliver(output, config).await
}

/// Log what the model exposes; the raw payload is written regardless
fn describe(value: &serde_json::Value) {
    match serde_json::from_value::<ControlsResponse>(value.clone()) {
        Ok(response) => {
            info!(
                "Model '{}' exposes {} control(s), {} media input(s)",
                response.card.name,
                response.ctrls.len(),
                response.media_input_count()
            );
            for ctrl in &response.ctrls {
                info!("  {}", ctrl);
            }
        }
        Err(e) => warn!("Controls payload has an unexpected layout: {}", e),
    }
}
