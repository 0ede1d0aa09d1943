//! Providers: a session with a source of backends.
//!
//! A [`Provider`] negotiates the account once (`load_account`), then lists
//! [`BackendDescriptor`]s and hands out [`Backend`] instances by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::capability::Capabilities;
use crate::error::HalResult;

/// Static configuration of a listed backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    pub num_qubits: u32,
    pub simulator: bool,
    pub max_shots: u32,
    pub basis_gates: Vec<String>,
}

impl From<&Capabilities> for BackendConfiguration {
    fn from(caps: &Capabilities) -> Self {
        Self {
            num_qubits: caps.num_qubits,
            simulator: caps.is_simulator,
            max_shots: caps.max_shots,
            basis_gates: caps.basis_gates.clone(),
        }
    }
}

/// Live status of a listed backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Whether the backend accepts jobs.
    pub operational: bool,
    /// Jobs waiting in the backend's queue.
    pub pending_jobs: u32,
    /// Human-readable status message.
    pub status_msg: String,
}

impl BackendStatus {
    /// An operational backend with `pending_jobs` queued.
    pub fn active(pending_jobs: u32) -> Self {
        Self {
            operational: true,
            pending_jobs,
            status_msg: "active".into(),
        }
    }

    /// A backend that is not accepting jobs.
    pub fn offline(reason: impl Into<String>) -> Self {
        Self {
            operational: false,
            pending_jobs: 0,
            status_msg: reason.into(),
        }
    }
}

/// A backend as reported by a provider listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub name: String,
    pub configuration: BackendConfiguration,
    pub status: BackendStatus,
}

impl BackendDescriptor {
    /// Create a descriptor.
    pub fn new(
        name: impl Into<String>,
        configuration: BackendConfiguration,
        status: BackendStatus,
    ) -> Self {
        Self {
            name: name.into(),
            configuration,
            status,
        }
    }

    /// Static configuration.
    pub fn configuration(&self) -> &BackendConfiguration {
        &self.configuration
    }

    /// Live status at listing time.
    pub fn status(&self) -> &BackendStatus {
        &self.status
    }

    /// Whether this is a simulator.
    pub fn is_simulator(&self) -> bool {
        self.configuration.simulator
    }
}

/// A source of backends behind one account.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, as registered.
    fn name(&self) -> &str;

    /// Negotiate the session.
    ///
    /// Fails with `AuthenticationFailed` when credentials are missing or
    /// rejected, and with `Connectivity` when the service is unreachable.
    /// Calling it again after success is a no-op.
    async fn load_account(&self) -> HalResult<()>;

    /// List the backends visible to the account.
    async fn list_backends(&self) -> HalResult<Vec<BackendDescriptor>>;

    /// Get a backend by name.
    async fn backend(&self, name: &str) -> HalResult<Box<dyn Backend>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_from_capabilities() {
        let caps = Capabilities::simulator("qasm_simulator", 20);
        let config = BackendConfiguration::from(&caps);
        assert_eq!(config.num_qubits, 20);
        assert!(config.simulator);
        assert_eq!(config.max_shots, 8192);
    }

    #[test]
    fn test_descriptor_accessors() {
        let caps = Capabilities::ibm("ibm_kyiv", 127);
        let desc = BackendDescriptor::new("ibm_kyiv", (&caps).into(), BackendStatus::active(3));
        assert!(!desc.is_simulator());
        assert_eq!(desc.configuration().num_qubits, 127);
        assert_eq!(desc.status().pending_jobs, 3);
        assert!(!BackendStatus::offline("maintenance").operational);
    }
}
