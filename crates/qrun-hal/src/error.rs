//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in HAL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// No backend satisfies the selection criteria.
    #[error("No available backend: {0}")]
    NoAvailableBackend(String),

    /// Account loading or token exchange was rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The provider could not be reached.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// More shots requested than the backend accepts.
    #[error("Shot limit exceeded: requested {requested}, backend maximum is {max}")]
    ShotLimitExceeded { requested: u32, max: u32 },

    /// Submission or result retrieval failed.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Invalid circuit.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Circuit exceeds backend capabilities.
    #[error("Circuit exceeds backend capabilities: {0}")]
    CircuitTooLarge(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
