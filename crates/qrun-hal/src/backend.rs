//! Backend trait and wait options.
//!
//! The [`Backend`] trait defines the lifecycle for interacting with a
//! quantum backend:
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)       (async)       (async)      (async)      (async)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&Capabilities` |
//! | `validate()` | async | yes | `HalResult<ValidationResult>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<ExecutionResult>` |
//! | `cancel()` | async | yes | `HalResult<()>` |
//! | `wait()` | async | provided | `HalResult<ExecutionResult>` |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qrun_ir::Circuit;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// Callback invoked on every observed status change while waiting.
pub type StatusObserver = Arc<dyn Fn(&JobId, &JobStatus) + Send + Sync>;

/// How long and how often [`Backend::wait`] polls.
#[derive(Clone)]
pub struct WaitOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Optional status observer (progress display, job monitor).
    pub observer: Option<StatusObserver>,
}

impl WaitOptions {
    /// Create wait options without an observer.
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            observer: None,
        }
    }

    /// Attach a status observer.
    pub fn with_observer(
        mut self,
        observer: impl Fn(&JobId, &JobStatus) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(600), Duration::from_millis(500))
    }
}

impl fmt::Debug for WaitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitOptions")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Outcome of checking a circuit against a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The circuit can be submitted as is.
    Valid,
    /// The circuit cannot run on this backend.
    Invalid { reasons: Vec<String> },
}

impl ValidationResult {
    /// Check if the circuit is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Trait for quantum backends.
///
/// # Contract
///
/// - `capabilities()` is synchronous and infallible; capabilities are
///   cached at construction time.
/// - `submit()` returns a `JobId` whose first status is `Submitted` or later.
/// - `result()` is only called once status is `Completed`.
/// - `wait()` has a default implementation that polls `status()`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Validate a circuit against backend constraints.
    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult>;

    /// Submit a circuit for execution.
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a running job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Wait for a job to reach a terminal state and return its result.
    ///
    /// Polls every `options.poll_interval`. Fails with `Timeout` once
    /// `options.timeout` elapses; a timeout too large to form a deadline
    /// waits without one. If `cancel` fires, the job is cancelled on the
    /// backend (best effort) and `JobCancelled` is returned.
    async fn wait(
        &self,
        job_id: &JobId,
        options: &WaitOptions,
        cancel: &CancelToken,
    ) -> HalResult<ExecutionResult> {
        let deadline = tokio::time::Instant::now().checked_add(options.timeout);
        let mut last: Option<JobStatus> = None;

        loop {
            if cancel.is_cancelled() {
                return cancel_on_backend(self, job_id).await;
            }

            let status = self.status(job_id).await?;
            if last.as_ref() != Some(&status) {
                info!(job_id = %job_id, status = %status, "Job status changed");
                if let Some(observer) = &options.observer {
                    observer(job_id, &status);
                }
                last = Some(status.clone());
            }

            match status {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Submitted | JobStatus::Queued | JobStatus::Running => {}
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return cancel_on_backend(self, job_id).await,
                () = sleep_until_deadline(deadline) => {
                    warn!(job_id = %job_id, timeout = ?options.timeout, "Gave up waiting for job");
                    return Err(HalError::Timeout(job_id.0.clone()));
                }
                () = tokio::time::sleep(options.poll_interval) => {}
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn cancel_on_backend<B: Backend + ?Sized>(
    backend: &B,
    job_id: &JobId,
) -> HalResult<ExecutionResult> {
    if let Err(e) = backend.cancel(job_id).await {
        warn!(job_id = %job_id, error = %e, "Failed to cancel job on backend");
    }
    Err(HalError::JobCancelled)
}
