//! Job lifecycle
//!
//! A job is submitted with a `POST /call/{endpoint}`. A background task then
//! reads the event stream at `/call/{endpoint}/{event_id}` and publishes every
//! status transition through a watch channel, so polling never blocks.

use async_trait::async_trait;
use harp_core::domain::endpoint::EndpointSignature;
use harp_core::domain::job::{JobOutput, JobStatus, Operation, StatusCode};
use harp_core::dto::call::{CallRequest, CallResponse};
use harp_core::dto::file::FileData;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::RemoteClient;
use crate::error::{ClientError, Result};
use crate::files::bind_arguments;
use crate::literal::decode_output;
use crate::sse::{SseDecoder, SseEvent};

/// Read-only view of a job's progress
pub trait JobHandle: Send + Sync {
    /// Identity of the job
    fn id(&self) -> &str;

    /// Current structured status; never blocks
    fn poll_status(&self) -> JobStatus;

    /// Whether the job reached a terminal state; never blocks
    fn poll_done(&self) -> bool {
        self.poll_status().is_terminal()
    }
}

/// Something that can ask the remote service to cancel outstanding work
#[async_trait]
pub trait CancelRequester: Send + Sync {
    /// Submit a cancel request without waiting for it to take effect
    ///
    /// Must be safe to call repeatedly and when nothing is outstanding.
    async fn request_cancel(&self);
}

/// A submitted remote job
#[derive(Debug)]
pub struct Job {
    id: String,
    status: watch::Receiver<JobStatus>,
    task: Option<JoinHandle<Result<Vec<Value>>>>,
}

impl JobHandle for Job {
    fn id(&self) -> &str {
        &self.id
    }

    fn poll_status(&self) -> JobStatus {
        self.status.borrow().clone()
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Decrements the outstanding-job count when the tracking task ends
struct OutstandingGuard(Arc<AtomicUsize>);

impl OutstandingGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RemoteClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a remote operation with positional arguments
    ///
    /// Returns as soon as the service has queued the job. Arguments are matched
    /// against the endpoint's declared parameters: the count must agree, and
    /// local paths given for file parameters are uploaded first.
    ///
    /// # Example
    /// ```no_run
    /// # use harp_client::{JobHandle, RemoteClient};
    /// # use harp_core::domain::job::Operation;
    /// # use serde_json::json;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = RemoteClient::connect("http://localhost:7860").await?;
    /// let job = client
    ///     .submit(Operation::Process, vec![json!("input.wav"), json!(7)])
    ///     .await?;
    /// println!("submitted {}", job.id());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, operation: Operation, args: Vec<Value>) -> Result<Job> {
        let signature = self.signature(operation)?;
        let bound = bind_arguments(signature, args)?;
        let data = self.encode_arguments(bound).await?;

        let event_id = self.post_call(signature, data).await?;
        info!("Submitted {} job {}", operation, event_id);

        let stream_url = format!(
            "{}/call/{}/{}",
            self.base_url,
            signature.call_name(),
            event_id
        );
        let (tx, rx) = watch::channel(JobStatus::default());
        let guard = match operation {
            Operation::Cancel => None,
            _ => Some(OutstandingGuard::acquire(&self.outstanding)),
        };
        let task = tokio::spawn(track_job(self.client.clone(), stream_url, tx, guard));

        Ok(Job {
            id: event_id,
            status: rx,
            task: Some(task),
        })
    }

    /// Wait for a job to finish and return its result
    ///
    /// File outputs are downloaded into the download directory.
    ///
    /// # Errors
    /// `ClientError::JobFailed` if the remote side reported a failure.
    pub async fn fetch_result(&self, mut job: Job) -> Result<JobOutput> {
        let task = job
            .task
            .take()
            .ok_or_else(|| ClientError::InternalError("job result already taken".to_string()))?;
        let outputs = task
            .await
            .map_err(|e| ClientError::InternalError(format!("job tracking task failed: {}", e)))??;

        let first = outputs.into_iter().next().ok_or_else(|| {
            ClientError::ParseError(format!("job {} completed without output", job.id))
        })?;

        match FileData::from_output(&first) {
            Some(file) => Ok(JobOutput::File(self.download_file(&file, &job.id).await?)),
            None => Ok(JobOutput::Data(decode_output(first))),
        }
    }

    /// Number of submitted jobs that have not reached a terminal state
    pub fn outstanding_jobs(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// POST a call and return its event id
    async fn post_call(&self, signature: &EndpointSignature, data: Vec<Value>) -> Result<String> {
        let url = format!("{}/call/{}", self.base_url, signature.call_name());
        let response = self
            .client
            .post(&url)
            .json(&CallRequest { data })
            .timeout(self.request_timeout)
            .send()
            .await?;

        let call: CallResponse = Self::handle_response(response).await?;
        Ok(call.event_id)
    }
}

#[async_trait]
impl CancelRequester for RemoteClient {
    async fn request_cancel(&self) {
        if self.outstanding_jobs() == 0 {
            info!("No outstanding job, cancel request skipped");
            return;
        }
        let Some(signature) = self.endpoints.get(&Operation::Cancel) else {
            warn!("Service exposes no cancel operation, cancel request skipped");
            return;
        };

        match self.post_call(signature, Vec::new()).await {
            Ok(event_id) => info!("Cancel request submitted ({})", event_id),
            Err(e) => warn!("Failed to submit cancel request: {}", e),
        }
    }
}

// =============================================================================
// Result Stream
// =============================================================================

enum Step {
    Continue,
    Complete(Vec<Value>),
}

/// Follows a job's event stream until it completes or fails
async fn track_job(
    client: Client,
    url: String,
    status: watch::Sender<JobStatus>,
    _guard: Option<OutstandingGuard>,
) -> Result<Vec<Value>> {
    let outcome = follow_stream(&client, &url, &status).await;
    if let Err(e) = &outcome {
        publish(
            &status,
            JobStatus::with_message(StatusCode::Failed, e.to_string()),
        );
    }
    outcome
}

async fn follow_stream(
    client: &Client,
    url: &str,
    status: &watch::Sender<JobStatus>,
) -> Result<Vec<Value>> {
    let mut response = client.get(url).send().await?;
    let code = response.status();
    if !code.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(code.as_u16(), error_text));
    }
    publish(status, JobStatus::new(StatusCode::Processing));

    let mut decoder = SseDecoder::default();
    while let Some(chunk) = response.chunk().await? {
        for event in decoder.feed(&chunk) {
            if let Step::Complete(outputs) = handle_event(event, status)? {
                return Ok(outputs);
            }
        }
    }
    if let Some(event) = decoder.finish() {
        if let Step::Complete(outputs) = handle_event(event, status)? {
            return Ok(outputs);
        }
    }

    Err(ClientError::JobFailed(
        "result stream closed before the job completed".to_string(),
    ))
}

fn handle_event(event: SseEvent, status: &watch::Sender<JobStatus>) -> Result<Step> {
    match event.event.as_str() {
        "heartbeat" => Ok(Step::Continue),
        "generating" => {
            publish(status, JobStatus::new(StatusCode::Iterating));
            Ok(Step::Continue)
        }
        "complete" => {
            let outputs: Vec<Value> = serde_json::from_str(&event.data).map_err(|e| {
                ClientError::ParseError(format!("Failed to parse job output: {}", e))
            })?;
            publish(status, JobStatus::new(StatusCode::Finished));
            Ok(Step::Complete(outputs))
        }
        "error" => Err(ClientError::JobFailed(error_message(&event.data))),
        other => {
            debug!("Ignoring {} event", other);
            Ok(Step::Continue)
        }
    }
}

/// Extracts a readable message from an error event's data
fn error_message(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(message)) => message,
        Ok(Value::Null) | Err(_) if data.trim().is_empty() || data.trim() == "null" => {
            "remote job reported an error".to_string()
        }
        _ => data.trim().to_string(),
    }
}

fn publish(status: &watch::Sender<JobStatus>, next: JobStatus) {
    status.send_if_modified(|current| {
        let changed = current.advance(next);
        if changed {
            debug!("Job status -> {}", current.code);
        }
        changed
    });
}
