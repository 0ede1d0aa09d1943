//! Error types for the IBM Quantum provider.

use qrun_hal::HalError;
use thiserror::Error;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when talking to IBM Quantum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IbmError {
    /// No credentials in the environment or configuration.
    #[error(
        "IBM Quantum credentials not found. Set IBM_API_KEY and IBM_SERVICE_CRN, or IBM_QUANTUM_TOKEN."
    )]
    MissingCredentials,

    /// API key given without the service instance.
    #[error("IBM_SERVICE_CRN environment variable is required when using IBM_API_KEY")]
    MissingServiceCrn,

    /// Token contains characters that cannot go into a header.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// IAM token exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("IBM Quantum API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend name not known to the account.
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Circuit could not be converted for submission.
    #[error("Circuit conversion error: {0}")]
    Circuit(String),

    /// Circuit cannot be lowered onto the device's gates and qubits.
    #[error("Cannot run on this device: {0}")]
    Transpile(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IbmError {
    /// Whether the service rejected the credentials.
    pub fn is_auth(&self) -> bool {
        match self {
            IbmError::MissingCredentials
            | IbmError::MissingServiceCrn
            | IbmError::InvalidToken
            | IbmError::IamTokenExchange(_) => true,
            IbmError::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        if e.is_auth() {
            return HalError::AuthenticationFailed(e.to_string());
        }
        match e {
            IbmError::Http(ref inner) if inner.is_decode() => HalError::Execution(e.to_string()),
            IbmError::Http(_) => HalError::Connectivity(e.to_string()),
            IbmError::BackendNotFound(name) => {
                HalError::Configuration(format!("unknown IBM backend '{name}'"))
            }
            IbmError::JobNotFound(id) => HalError::JobNotFound(id),
            IbmError::Circuit(msg) => HalError::InvalidCircuit(msg),
            IbmError::Transpile(_) => HalError::InvalidCircuit(e.to_string()),
            IbmError::Json(inner) => HalError::Serialization(inner),
            other => HalError::Execution(other.to_string()),
        }
    }
}
