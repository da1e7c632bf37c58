//! Job poller
//!
//! Polls a submitted job at a fixed interval until it finishes, the deadline
//! passes, or cancellation is requested. Both early exits send exactly one
//! cancel request and then write the cancellation marker.

use harp_client::{CancelRequester, JobHandle};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::cancel::{CancelReason, CancelSignal};
use crate::status::StatusFlag;

/// How a polling run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job reached a terminal state; its result can be fetched
    Completed,
    /// Cancellation was requested; no result will be fetched
    Cancelled(CancelReason),
    /// The deadline passed first
    TimedOut(Duration),
}

/// Polls one job with configurable exit conditions
pub struct JobPoller<'a, C: CancelRequester + ?Sized> {
    canceller: &'a C,
    interval: Duration,
    timeout: Option<Duration>,
    cancel_signal: Option<CancelSignal>,
    status_flag: Option<StatusFlag>,
}

impl<'a, C: CancelRequester + ?Sized> JobPoller<'a, C> {
    /// Creates a poller that only stops on completion
    pub fn new(canceller: &'a C, interval: Duration) -> Self {
        Self {
            canceller,
            interval,
            timeout: None,
            cancel_signal: None,
            status_flag: None,
        }
    }

    /// Give up once `timeout` of wall time has elapsed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stop when `signal` reports a cancellation request
    pub fn with_cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.cancel_signal = Some(signal);
        self
    }

    /// Persist progress to `flag`, if given
    pub fn with_status_flag(mut self, flag: Option<StatusFlag>) -> Self {
        self.status_flag = flag;
        self
    }

    /// Starts the polling loop
    pub async fn run<J: JobHandle + ?Sized>(&self, job: &J) -> PollOutcome {
        let started = Instant::now();
        info!(
            "Polling job {} (interval: {:?}, timeout: {:?})",
            job.id(),
            self.interval,
            self.timeout
        );

        loop {
            if job.poll_done() {
                debug!("Job {} reached {}", job.id(), job.poll_status().code);
                return PollOutcome::Completed;
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() > limit {
                    warn!("Job {} did not finish within {:?}", job.id(), limit);
                    self.cancel().await;
                    return PollOutcome::TimedOut(limit);
                }
            }

            if let Some(reason) = self.cancel_signal.as_ref().and_then(CancelSignal::check) {
                info!("Cancelling job {}: {}", job.id(), reason);
                self.cancel().await;
                return PollOutcome::Cancelled(reason);
            }

            if let Some(flag) = &self.status_flag {
                flag.write_status(job.poll_status().code).await;
            }

            time::sleep(self.interval).await;
        }
    }

    async fn cancel(&self) {
        self.canceller.request_cancel().await;
        if let Some(flag) = &self.status_flag {
            flag.write_cancelled().await;
        }
    }
}
