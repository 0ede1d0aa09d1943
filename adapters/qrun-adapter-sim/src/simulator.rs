//! Simulator backend implementation.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use qrun_hal::{
    Backend, Capabilities, ExecutionResult, HalError, HalResult, Job, JobId, JobStatus,
    ValidationResult,
};
use qrun_ir::Circuit;

use crate::execution::{sample_counts, unitary_statevector};

/// Name of the counts-only simulator.
pub const QASM_SIMULATOR: &str = "qasm_simulator";
/// Name of the simulator that also returns the final statevector.
pub const STATEVECTOR_SIMULATOR: &str = "statevector_simulator";

/// Default qubit limit of the local simulators.
pub const DEFAULT_MAX_QUBITS: u32 = 20;
/// Default shot limit of the local simulators.
pub const DEFAULT_MAX_SHOTS: u32 = 8192;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

type JobTable = Arc<Mutex<FxHashMap<String, SimJob>>>;

fn lock(jobs: &JobTable) -> MutexGuard<'_, FxHashMap<String, SimJob>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Move a job along the lifecycle; `false` if it is gone or already terminal.
fn advance(jobs: &JobTable, job_id: &JobId, status: JobStatus) -> bool {
    let mut jobs = lock(jobs);
    match jobs.get_mut(&job_id.0) {
        Some(sim_job) => sim_job.job.advance(status),
        None => false,
    }
}

/// Local simulator backend.
///
/// Jobs run on a spawned task and move through
/// `Submitted → Queued → Running → Completed`. Circuits are limited to
/// [`DEFAULT_MAX_QUBITS`] qubits unless configured otherwise.
pub struct SimulatorBackend {
    capabilities: Capabilities,
    /// Active jobs.
    jobs: JobTable,
    /// Time a job spends queued before it runs.
    queue_delay: Duration,
}

impl SimulatorBackend {
    /// The `qasm_simulator` backend with default limits.
    pub fn new() -> Self {
        Self::named(QASM_SIMULATOR, DEFAULT_MAX_QUBITS)
    }

    /// The `statevector_simulator` backend with default limits.
    pub fn statevector() -> Self {
        Self::named(STATEVECTOR_SIMULATOR, DEFAULT_MAX_QUBITS)
    }

    /// A simulator called `name` supporting `max_qubits` qubits.
    ///
    /// `statevector_simulator` also reports the final amplitudes.
    pub fn named(name: &str, max_qubits: u32) -> Self {
        let mut capabilities =
            Capabilities::simulator(name, max_qubits).with_max_shots(DEFAULT_MAX_SHOTS);
        if name == STATEVECTOR_SIMULATOR {
            capabilities = capabilities.with_feature("statevector");
        }
        Self {
            capabilities,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            queue_delay: Duration::ZERO,
        }
    }

    /// Keep jobs queued for `delay` before running them.
    pub fn with_queue_delay(mut self, delay: Duration) -> Self {
        self.queue_delay = delay;
        self
    }

    /// Set the shot limit.
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.capabilities = self.capabilities.with_max_shots(max_shots);
        self
    }

    fn returns_statevector(&self) -> bool {
        self.capabilities.has_feature("statevector")
    }

    /// Number of jobs not yet in a terminal state.
    pub fn pending_jobs(&self) -> usize {
        lock(&self.jobs)
            .values()
            .filter(|j| j.job.status.is_pending())
            .count()
    }

    fn check_circuit(&self, circuit: &Circuit) -> HalResult<()> {
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but {} only supports {}",
                circuit.num_qubits(),
                self.capabilities.name,
                self.capabilities.num_qubits
            )));
        }
        if self.returns_statevector() && circuit.instructions().iter().any(|i| i.is_reset()) {
            return Err(HalError::Unsupported(format!(
                "{} cannot return a statevector for a circuit with reset",
                self.capabilities.name
            )));
        }
        Ok(())
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the simulation off the async runtime.
fn execute(circuit: &Circuit, shots: u32, with_statevector: bool) -> ExecutionResult {
    let start = Instant::now();
    debug!(
        "Starting simulation: {} qubits, {} shots",
        circuit.num_qubits(),
        shots
    );

    let counts = sample_counts(circuit, shots, &mut rand::thread_rng());
    let mut result = ExecutionResult::new(counts, shots);
    if with_statevector {
        result = result.with_statevector(unitary_statevector(circuit).amplitudes());
    }

    let elapsed = start.elapsed();
    debug!("Simulation completed in {:?}", elapsed);
    result.with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        match self.check_circuit(circuit) {
            Ok(()) => Ok(ValidationResult::Valid),
            Err(e) => Ok(ValidationResult::Invalid {
                reasons: vec![e.to_string()],
            }),
        }
    }

    #[instrument(skip(self, circuit), fields(backend = %self.capabilities.name))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be greater than 0".into()));
        }
        if shots > self.capabilities.max_shots {
            return Err(HalError::ShotLimitExceeded {
                requested: shots,
                max: self.capabilities.max_shots,
            });
        }
        self.check_circuit(circuit)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots).with_backend(self.capabilities.name.clone());
        lock(&self.jobs).insert(job_id.0.clone(), SimJob { job, result: None });
        debug!("Submitted job: {}", job_id);

        let jobs = Arc::clone(&self.jobs);
        let circuit = circuit.clone();
        let id = job_id.clone();
        let queue_delay = self.queue_delay;
        let with_statevector = self.returns_statevector();

        tokio::spawn(async move {
            if !advance(&jobs, &id, JobStatus::Queued) {
                return;
            }
            tokio::time::sleep(queue_delay).await;
            if !advance(&jobs, &id, JobStatus::Running) {
                debug!("Job {} left the queue before running", id);
                return;
            }

            let outcome =
                tokio::task::spawn_blocking(move || execute(&circuit, shots, with_statevector))
                    .await;

            let mut table = lock(&jobs);
            let Some(sim_job) = table.get_mut(&id.0) else {
                return;
            };
            match outcome {
                Ok(result) => {
                    if sim_job.job.advance(JobStatus::Completed) {
                        sim_job.result = Some(result);
                    }
                }
                Err(e) => {
                    warn!("Simulation task for job {} failed: {}", id, e);
                    sim_job.job.advance(JobStatus::Failed(e.to_string()));
                }
            }
        });

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        lock(&self.jobs)
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = lock(&self.jobs);
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        sim_job.result.clone().ok_or_else(|| {
            HalError::Execution(format!(
                "job {} has no result (status: {})",
                job_id, sim_job.job.status
            ))
        })
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = lock(&self.jobs);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if sim_job.job.advance(JobStatus::Cancelled) {
            debug!("Cancelled job: {}", job_id);
        }
        Ok(())
    }
}
