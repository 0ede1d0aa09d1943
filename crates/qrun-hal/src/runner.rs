//! Circuit runner: measure, submit, wait, collect.

use qrun_ir::Circuit;
use tracing::{info, instrument, warn};

use crate::backend::{Backend, ValidationResult, WaitOptions};
use crate::cancel::CancelToken;
use crate::error::{HalError, HalResult};
use crate::job::JobId;
use crate::result::ExecutionResult;

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of shots.
    pub shots: u32,
    /// Append a barrier and a full measurement before submitting.
    pub measure: bool,
    /// Polling and timeout for the job wait.
    pub wait: WaitOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shots: 1024,
            measure: true,
            wait: WaitOptions::default(),
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The circuit as submitted, including any added measurements.
    pub circuit: Circuit,
    pub job_id: JobId,
    /// Name of the backend that executed the job.
    pub backend: String,
    pub result: ExecutionResult,
}

/// Run `circuit` on `backend` and block until it finishes.
///
/// With `options.measure`, every qubit is measured into the clbit of the
/// same index after a barrier. Without it the circuit is submitted as is.
/// The returned counts always sum to `options.shots`.
#[instrument(skip_all, fields(backend = backend.name(), shots = options.shots))]
pub async fn run(
    circuit: &Circuit,
    backend: &dyn Backend,
    options: &RunOptions,
    cancel: &CancelToken,
) -> HalResult<RunOutcome> {
    let shots = options.shots;
    if shots == 0 {
        return Err(HalError::InvalidShots("shots must be greater than 0".into()));
    }
    let max = backend.capabilities().max_shots;
    if shots > max {
        return Err(HalError::ShotLimitExceeded {
            requested: shots,
            max,
        });
    }

    let mut circuit = circuit.clone();
    if options.measure {
        circuit
            .measure_all()
            .map_err(|e| HalError::InvalidCircuit(e.to_string()))?;
    } else {
        warn!("Circuit is not measured; results will not be statistically meaningful");
    }

    if let ValidationResult::Invalid { reasons } = backend.validate(&circuit).await? {
        return Err(HalError::InvalidCircuit(reasons.join("; ")));
    }

    let job_id = backend.submit(&circuit, shots).await?;
    info!(job_id = %job_id, "Job submitted");

    let result = backend.wait(&job_id, &options.wait, cancel).await?;

    let total = result.counts.total_shots();
    if total != u64::from(shots) {
        return Err(HalError::Execution(format!(
            "job {job_id} returned {total} counts for {shots} shots"
        )));
    }

    Ok(RunOutcome {
        circuit,
        job_id,
        backend: backend.name().to_string(),
        result,
    })
}
