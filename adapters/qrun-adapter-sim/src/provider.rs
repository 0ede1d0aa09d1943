//! Local provider serving the simulator backends.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use qrun_hal::{
    Backend, BackendConfiguration, BackendDescriptor, BackendStatus, HalError, HalResult,
    Provider, ProviderConfig, ProviderRegistry,
};

use crate::simulator::{DEFAULT_MAX_QUBITS, QASM_SIMULATOR, STATEVECTOR_SIMULATOR, SimulatorBackend};

/// Name under which [`register`] installs the provider.
pub const PROVIDER_NAME: &str = "sim";

/// Provider exposing `qasm_simulator` and `statevector_simulator`.
///
/// No account is needed; `load_account` always succeeds.
#[derive(Debug, Clone)]
pub struct SimulatorProvider {
    max_qubits: u32,
    queue_delay: Duration,
}

impl SimulatorProvider {
    /// Create a provider with default limits.
    pub fn new() -> Self {
        Self {
            max_qubits: DEFAULT_MAX_QUBITS,
            queue_delay: Duration::ZERO,
        }
    }

    /// Build from registry configuration (`max_qubits`, `queue_delay_ms`).
    pub fn from_config(config: &ProviderConfig) -> HalResult<Self> {
        let mut provider = Self::new();
        if let Some(value) = config.extra.get("max_qubits") {
            provider.max_qubits = value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    HalError::Configuration(format!("invalid max_qubits: {value}"))
                })?;
        }
        if let Some(ms) = config.extra.get("queue_delay_ms").and_then(|v| v.as_u64()) {
            provider.queue_delay = Duration::from_millis(ms);
        }
        Ok(provider)
    }

    fn build(&self, name: &str) -> SimulatorBackend {
        SimulatorBackend::named(name, self.max_qubits).with_queue_delay(self.queue_delay)
    }
}

impl Default for SimulatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for SimulatorProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn load_account(&self) -> HalResult<()> {
        Ok(())
    }

    async fn list_backends(&self) -> HalResult<Vec<BackendDescriptor>> {
        Ok([QASM_SIMULATOR, STATEVECTOR_SIMULATOR]
            .into_iter()
            .map(|name| {
                let backend = self.build(name);
                BackendDescriptor::new(
                    name,
                    BackendConfiguration::from(backend.capabilities()),
                    BackendStatus::active(0),
                )
            })
            .collect())
    }

    async fn backend(&self, name: &str) -> HalResult<Box<dyn Backend>> {
        match name {
            QASM_SIMULATOR | STATEVECTOR_SIMULATOR => {
                debug!("Creating simulator backend: {}", name);
                Ok(Box::new(self.build(name)))
            }
            other => Err(HalError::Configuration(format!(
                "unknown simulator backend '{other}', expected '{QASM_SIMULATOR}' or '{STATEVECTOR_SIMULATOR}'"
            ))),
        }
    }
}

/// Install the simulator provider as `"sim"`.
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(PROVIDER_NAME, |config| {
        Ok(Box::new(SimulatorProvider::from_config(config)?))
    });
}
