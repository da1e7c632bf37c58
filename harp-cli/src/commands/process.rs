//! Process mode
//!
//! Runs the model on the positional values in the controls file. The job runs
//! until it finishes or cancellation is requested by signal or flag file.

use harp_core::domain::job::Operation;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use super::{Outcome, connect, deliver, fetch};
use crate::cancel::CancelSignal;
use crate::config::Config;
use crate::error::RunError;
use crate::poller::{JobPoller, PollOutcome};

/// Run the process operation
pub async fn run_process(config: &Config) -> Result<Outcome, RunError> {
    let ctrls_path = config.ctrls_path.as_deref().ok_or_else(|| {
        RunError::Configuration("Please specify a ctrls path in process mode".to_string())
    })?;
    let args = load_controls(ctrls_path).await?;

    let cancel = CancelSignal::new(config.cancel_flag_path.clone());
    let listener = cancel.listen_for_signals();
    let result = submit_and_poll(config, args, cancel).await;
    listener.abort();
    result
}

async fn submit_and_poll(
    config: &Config,
    args: Vec<Value>,
    cancel: CancelSignal,
) -> Result<Outcome, RunError> {
    let client = connect(config).await?;

    // A request that arrived during connect stops the job before upload
    if let Some(reason) = cancel.check() {
        info!("Cancelled before submission ({})", reason);
        if let Some(flag) = config.status_flag() {
            flag.write_cancelled().await;
        }
        return Ok(Outcome::Cancelled);
    }

    let job = client.submit(Operation::Process, args).await?;

    let outcome = JobPoller::new(&client, config.poll_interval)
        .with_cancel_signal(cancel)
        .with_status_flag(config.status_flag())
        .run(&job)
        .await;

    match outcome {
        PollOutcome::Completed => {
            let output = fetch(&client, job, config).await?;
            deliver(output, config).await
        }
        PollOutcome::Cancelled(reason) => {
            info!("Job cancelled ({}), no output written", reason);
            Ok(Outcome::Cancelled)
        }
        PollOutcome::TimedOut(limit) => Err(RunError::Timeout(limit)),
    }
}

/// Read the positional control values
///
/// The file must hold a JSON array; anything else is rejected before any
/// network request is made.
async fn load_controls(path: &Path) -> Result<Vec<Value>, RunError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        RunError::Configuration(format!("Cannot read ctrls file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        RunError::Configuration(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    match value {
        Value::Array(values) => {
            debug!("Loaded {} control value(s)", values.len());
            Ok(values)
        }
        other => Err(RunError::Configuration(format!(
            "ctrls file {} must contain a JSON list, found {}",
            path.display(),
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use harp_client::test_support::{JobBehavior, MockService};
    use harp_core::domain::job::CANCELLATION_MARKER;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::time::Instant;

    struct Fixture {
        dir: tempfile::TempDir,
        config: Config,
    }

    impl Fixture {
        fn new(url: &str, ctrls: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let ctrls_path = dir.path().join("ctrls.json");
            std::fs::write(&ctrls_path, ctrls).unwrap();

            let mut config = Config::new(url, dir.path().join("out.wav"), Mode::Process);
            config.ctrls_path = Some(ctrls_path);
            config.cancel_flag_path = Some(dir.path().join("cancel.flag"));
            config.status_flag_path = Some(dir.path().join("status.txt"));
            config.poll_interval = Duration::from_millis(10);
            config.request_timeout = Duration::from_secs(5);
            config.download_dir = dir.path().join("downloads");
            Self { dir, config }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn with_input(url: &str, extra: Value) -> Self {
            let fixture = Self::new(url, "[]");
            let input = fixture.path("input.wav");
            std::fs::write(&input, b"RIFF-input").unwrap();

            let mut values = vec![json!(input.to_string_lossy())];
            if let Value::Array(rest) = extra {
                values.extend(rest);
            }
            std::fs::write(
                fixture.path("ctrls.json"),
                serde_json::to_string(&values).unwrap(),
            )
            .unwrap();
            fixture
        }
    }

    #[tokio::test]
    async fn test_process_delivers_output() {
        let service = MockService::start(JobBehavior::Complete).await;
        let fixture = Fixture::with_input(&service.url, json!([7]));

        let outcome = run_process(&fixture.config).await.unwrap();

        assert_eq!(outcome, Outcome::Completed(fixture.path("out.wav")));
        assert_eq!(std::fs::read(fixture.path("out.wav")).unwrap(), b"processed-audio");
        assert_eq!(
            std::fs::read_to_string(fixture.path("status.txt")).unwrap(),
            "FINISHED"
        );

        let submitted = service.state.calls("process");
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0][0]["meta"]["_type"], "gradio.FileData");
        assert_eq!(submitted[0][1], json!(7));
        assert!(service.state.calls("cancel").is_empty());
    }

    #[tokio::test]
    async fn test_ctrls_not_a_list_fails_before_network() {
        let service = MockService::start(JobBehavior::Complete).await;
        let fixture = Fixture::new(&service.url, r#"{"pitch": 7}"#);

        let err = run_process(&fixture.config).await.unwrap_err();

        assert!(matches!(err, RunError::Configuration(ref msg) if msg.contains("JSON list")));
        assert_eq!(service.state.request_count(), 0);
    }

    #[tokio::test]
    async fn test_count_mismatch_fails_before_submission() {
        let service = MockService::start(JobBehavior::Complete).await;
        let fixture = Fixture::with_input(&service.url, json!([7, 3]));

        let err = run_process(&fixture.config).await.unwrap_err();

        assert!(matches!(err, RunError::Configuration(_)));
        assert!(service.state.calls("process").is_empty());
        assert_eq!(service.state.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_flag_file_mid_poll_cancels_without_output() {
        let service = MockService::start(JobBehavior::Hang).await;
        let mut fixture = Fixture::with_input(&service.url, json!([7]));
        let interval = Duration::from_millis(200);
        fixture.config.poll_interval = interval;

        let flag = fixture.path("cancel.flag");
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            std::fs::write(flag, "").unwrap();
            Instant::now()
        });

        let outcome = tokio::time::timeout(Duration::from_secs(10), run_process(&fixture.config))
            .await
            .unwrap()
            .unwrap();
        let returned_at = Instant::now();
        let created_at = writer.await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        // One interval, plus the local cancel round trip
        assert!(returned_at <= created_at + interval + Duration::from_millis(100));
        assert_eq!(service.state.calls("cancel").len(), 1);
        assert_eq!(
            std::fs::read_to_string(fixture.path("status.txt")).unwrap(),
            CANCELLATION_MARKER
        );
        assert!(!fixture.path("out.wav").exists());
        assert!(fixture.path("cancel.flag").exists());
    }

    #[tokio::test]
    async fn test_flag_present_before_submission_skips_job() {
        let service = MockService::start(JobBehavior::Complete).await;
        let fixture = Fixture::with_input(&service.url, json!([7]));
        std::fs::write(fixture.path("cancel.flag"), "").unwrap();

        let outcome = run_process(&fixture.config).await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(service.state.upload_count(), 0);
        assert!(service.state.calls("process").is_empty());
        assert!(service.state.calls("cancel").is_empty());
        assert_eq!(
            std::fs::read_to_string(fixture.path("status.txt")).unwrap(),
            CANCELLATION_MARKER
        );
        assert!(!fixture.path("out.wav").exists());
    }

    #[tokio::test]
    async fn test_remote_failure_is_reported() {
        let service = MockService::start(JobBehavior::Error).await;
        let fixture = Fixture::with_input(&service.url, json!([7]));

        let err = run_process(&fixture.config).await.unwrap_err();

        assert!(matches!(err, RunError::Client(_)));
        assert!(!fixture.path("out.wav").exists());
    }

    #[tokio::test]
    async fn test_missing_ctrls_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_controls(&dir.path().join("missing.json")).await.unwrap_err();
        assert!(matches!(err, RunError::Configuration(_)));
    }
}
