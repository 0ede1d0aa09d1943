//! Backend capabilities.

use serde::{Deserialize, Serialize};

/// Hardware capabilities of a quantum backend.
///
/// Cached at construction time; the runner checks shot counts against
/// `max_shots` and backends check circuit width against `num_qubits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Gate names the backend executes natively.
    pub basis_gates: Vec<String>,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags such as `"statevector"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a local simulator.
    pub fn simulator(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            basis_gates: [
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz",
                "p", "u", "cx", "cy", "cz", "ch", "swap", "cp", "crz", "ccx", "cswap",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_shots: 8192,
            is_simulator: true,
            features: vec![],
        }
    }

    /// Create capabilities for IBM devices.
    pub fn ibm(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            basis_gates: ["id", "rz", "sx", "x", "ecr", "cz"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_shots: 100_000,
            is_simulator: false,
            features: vec![],
        }
    }

    /// Set the shot limit.
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Add a feature flag.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Check whether a feature flag is present.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}
