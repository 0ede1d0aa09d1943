//! Backend selection.
//!
//! Picks the least busy real (non-simulator) backend that satisfies a qubit
//! requirement:
//!
//! | `min_qubits` | Candidates |
//! |--------------|------------|
//! | `> 0` | non-simulators with **more than** `min_qubits` qubits |
//! | `== 0` | all non-simulators |
//! | `< 0` | all non-simulators, after a warning |

use tracing::{debug, info, instrument, warn};

use crate::error::{HalError, HalResult};
use crate::provider::{BackendDescriptor, Provider};

/// Qubit-count policy derived from `min_qubits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QubitRequirement {
    /// Strictly more than this many qubits.
    MoreThan(u32),
    /// Any qubit count.
    Any,
}

impl QubitRequirement {
    /// Normalise a raw `min_qubits` value.
    ///
    /// Negative values are treated as zero, with a warning.
    pub fn from_min_qubits(min_qubits: i64) -> Self {
        if min_qubits > 0 {
            QubitRequirement::MoreThan(u32::try_from(min_qubits).unwrap_or(u32::MAX))
        } else {
            if min_qubits < 0 {
                warn!(
                    min_qubits,
                    "Negative qubit requirement, falling back to all non-simulator backends"
                );
            }
            QubitRequirement::Any
        }
    }

    /// Whether `backend` is a candidate under this requirement.
    pub fn accepts(&self, backend: &BackendDescriptor) -> bool {
        let config = backend.configuration();
        if config.simulator {
            return false;
        }
        match *self {
            QubitRequirement::MoreThan(n) => config.num_qubits > n,
            QubitRequirement::Any => true,
        }
    }
}

/// The operational backend with the fewest pending jobs.
///
/// Ties go to the earliest candidate.
pub fn least_busy<'a>(
    candidates: impl IntoIterator<Item = &'a BackendDescriptor>,
) -> Option<&'a BackendDescriptor> {
    candidates
        .into_iter()
        .filter(|b| b.status().operational)
        .min_by_key(|b| b.status().pending_jobs)
}

/// Select from an already-listed set of backends.
pub fn select_from(
    backends: &[BackendDescriptor],
    requirement: QubitRequirement,
) -> HalResult<BackendDescriptor> {
    let candidates: Vec<&BackendDescriptor> =
        backends.iter().filter(|b| requirement.accepts(b)).collect();
    debug!(
        candidates = candidates.len(),
        listed = backends.len(),
        ?requirement,
        "Filtered backends"
    );

    if candidates.is_empty() {
        return Err(HalError::NoAvailableBackend(match requirement {
            QubitRequirement::MoreThan(n) => {
                format!("no non-simulator backend with more than {n} qubits")
            }
            QubitRequirement::Any => "no non-simulator backend".to_string(),
        }));
    }

    least_busy(candidates.iter().copied())
        .cloned()
        .ok_or_else(|| {
            HalError::NoAvailableBackend(format!(
                "all {} candidate backends are offline",
                candidates.len()
            ))
        })
}

/// Load the account, list backends and pick the least busy candidate.
#[instrument(skip(provider), fields(provider = provider.name()))]
pub async fn select_backend(
    provider: &dyn Provider,
    min_qubits: i64,
) -> HalResult<BackendDescriptor> {
    let requirement = QubitRequirement::from_min_qubits(min_qubits);

    provider.load_account().await?;
    let backends = provider.list_backends().await?;
    for backend in &backends {
        info!(
            backend = %backend.name,
            num_qubits = backend.configuration().num_qubits,
            simulator = backend.configuration().simulator,
            operational = backend.status().operational,
            pending_jobs = backend.status().pending_jobs,
            status = %backend.status().status_msg,
            "Listed backend"
        );
    }

    let chosen = select_from(&backends, requirement)?;
    info!(
        backend = %chosen.name,
        pending_jobs = chosen.status().pending_jobs,
        "Selected least busy backend"
    );
    Ok(chosen)
}
