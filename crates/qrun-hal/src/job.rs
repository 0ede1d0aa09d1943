//! Job lifecycle types.
//!
//! The job state machine:
//!
//! ```text
//!   submit() ──→ Submitted ──→ Queued ──→ Running ──→ Completed
//!                    │            │           │
//!                    │            │           ├──→ Failed(reason)
//!                    │            │           │
//!                    └────────────┴───────────┴──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - Transitions are monotonic: a job never moves backward.
//! - Terminal states (`Completed`, `Failed`, `Cancelled`) are permanent.
//! - `result()` is only valid when status is `Completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted, not yet queued.
    Submitted,
    /// Waiting for the device.
    Queued,
    /// Executing.
    Running,
    /// Finished; results are available.
    Completed,
    /// Finished with an error, as reported by the backend.
    Failed(String),
    /// Cancelled by the user or the backend.
    Cancelled,
}

impl JobStatus {
    /// `Completed`, `Failed` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Not yet terminal.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            JobStatus::Submitted | JobStatus::Queued | JobStatus::Running
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    /// Position in the lifecycle; terminal states share the last rank.
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Submitted => 0,
            JobStatus::Queued => 1,
            JobStatus::Running => 2,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled => 3,
        }
    }

    /// Whether moving from `self` to `next` respects the state machine.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "Submitted"),
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A submitted job as a backend tracks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub shots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set on the first move to `Running`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Set on reaching a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

impl Job {
    /// A job in the `Submitted` state, stamped with the current time.
    pub fn new(id: impl Into<JobId>, shots: u32) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Submitted,
            shots,
            created_at: Some(Utc::now()),
            started_at: None,
            finished_at: None,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Move to `status` if the transition is allowed.
    ///
    /// Returns `false` and leaves the job untouched otherwise.
    pub fn advance(&mut self, status: JobStatus) -> bool {
        if !self.status.can_transition_to(&status) {
            return false;
        }
        self.status = status;
        if matches!(self.status, JobStatus::Running) && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if self.status.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    /// Wall-clock time between start and finish, in milliseconds.
    pub fn elapsed_ms(&self) -> Option<u64> {
        let start = self.started_at?;
        let end = self.finished_at?;
        u64::try_from((end - start).num_milliseconds()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed("error".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new("job-123", 1000).with_backend("qasm_simulator");

        assert_eq!(job.id.0, "job-123");
        assert_eq!(job.shots, 1000);
        assert_eq!(job.status, JobStatus::Submitted);
        assert_eq!(job.backend, Some("qasm_simulator".to_string()));
        assert!(job.created_at.is_some());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = Job::new("job-1", 10);
        assert!(job.advance(JobStatus::Queued));
        assert!(job.advance(JobStatus::Running));
        assert!(job.started_at.is_some());
        assert!(job.advance(JobStatus::Completed));
        assert!(job.finished_at.is_some());
        assert!(job.elapsed_ms().is_some());
    }

    #[test]
    fn test_job_never_moves_backward() {
        let mut job = Job::new("job-2", 10);
        assert!(job.advance(JobStatus::Running));
        assert!(!job.advance(JobStatus::Queued));
        assert!(job.advance(JobStatus::Cancelled));
        assert!(!job.advance(JobStatus::Completed));
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(JobStatus::Submitted.to_string(), "Submitted");
        assert_eq!(JobStatus::Failed("boom".into()).to_string(), "Failed: boom");
    }
}
