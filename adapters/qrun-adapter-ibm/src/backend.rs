//! IBM Quantum backend implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use qrun_hal::{
    Backend, BackendConfiguration, BackendDescriptor, BackendStatus, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, JobId, JobStatus, ValidationResult,
};
use qrun_ir::Circuit;
use qrun_qasm::emit_qasm3_physical;

use crate::client::{BackendInfo, IbmClient, JobResultResponse, JobStatusResponse};
use crate::error::{IbmError, IbmResult};
use crate::transpile::Target;

/// Classical register layout `(name, size)` in declaration order.
type Registers = Vec<(String, u32)>;

/// One IBM Quantum device.
///
/// Circuits are lowered onto the device's native gates and physical qubits,
/// then sent as `OpenQASM` 3 to the Sampler V2 primitive, which returns
/// per-shot hex samples for each classical register. The register layout of
/// every submitted job is kept so the samples can be joined back into
/// bit-strings of the circuit's full classical width.
pub struct IbmBackend {
    client: Arc<IbmClient>,
    capabilities: Capabilities,
    target: Target,
    jobs: Arc<Mutex<FxHashMap<String, Registers>>>,
}

impl IbmBackend {
    /// Create a backend for the device described by `info`.
    pub fn new(client: Arc<IbmClient>, info: &BackendInfo) -> Self {
        let capabilities = capabilities_from(info);
        let target = Target::new(
            capabilities.num_qubits,
            &capabilities.basis_gates,
            &info.coupling_map,
        );
        Self {
            client,
            capabilities,
            target,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// `OpenQASM` 3 of `circuit` in native gates on physical qubits.
    fn device_qasm(&self, circuit: &Circuit) -> IbmResult<String> {
        let isa = self.target.compile(circuit)?;
        debug!(
            "Lowered {} gates to {} native gates, layout {:?}",
            circuit.gate_count(),
            isa.circuit.gate_count(),
            isa.layout
        );
        emit_qasm3_physical(&isa.circuit, &isa.layout)
            .map_err(|e| IbmError::Circuit(e.to_string()))
    }

    fn jobs(&self) -> MutexGuard<'_, FxHashMap<String, Registers>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Capabilities reported by the device configuration.
pub(crate) fn capabilities_from(info: &BackendInfo) -> Capabilities {
    let mut caps = Capabilities::ibm(&info.name, info.num_qubits);
    if !info.basis_gates.is_empty() {
        caps.basis_gates = info.basis_gates.clone();
    }
    if let Some(max_shots) = info.max_shots {
        caps.max_shots = max_shots;
    }
    caps.is_simulator = info.simulator;
    caps
}

/// Listing entry for a device.
pub(crate) fn descriptor_from(info: &BackendInfo) -> BackendDescriptor {
    let status = BackendStatus {
        operational: info.operational,
        pending_jobs: info.pending_jobs,
        status_msg: info.status_msg.clone(),
    };
    BackendDescriptor::new(
        &info.name,
        BackendConfiguration::from(&capabilities_from(info)),
        status,
    )
}

/// Map an IBM status string onto the job lifecycle.
///
/// The Cloud API reports mixed case ("Completed"); unknown values count as
/// still running so the wait loop keeps polling.
pub(crate) fn map_status(response: &JobStatusResponse) -> JobStatus {
    match response.status.to_uppercase().as_str() {
        "INITIALIZING" => JobStatus::Submitted,
        "QUEUED" => JobStatus::Queued,
        "VALIDATING" | "RUNNING" => JobStatus::Running,
        "COMPLETED" | "DONE" => JobStatus::Completed,
        "FAILED" | "ERROR" => JobStatus::Failed(
            response
                .reason()
                .unwrap_or("job failed without a reason")
                .to_string(),
        ),
        "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
        _ => JobStatus::Running,
    }
}

/// Join per-register samples into counts keyed by bit-strings.
///
/// The last declared register ends up leftmost, so bit `i` of the circuit
/// is character `width - 1 - i`. Without a known layout the registers are
/// taken in name order with widths inferred from the samples.
pub(crate) fn decode_counts(results: &JobResultResponse, registers: &[(String, u32)]) -> Counts {
    let mut counts = Counts::new();
    let Some(result) = results.results.first() else {
        return counts;
    };

    let layout: Registers = if registers.is_empty() {
        let mut names: Vec<_> = result.data.keys().cloned().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let width = infer_bit_width(&result.data[&name].samples);
                (name, width)
            })
            .collect()
    } else {
        registers.to_vec()
    };

    let shots = result
        .data
        .values()
        .map(|register| register.samples.len())
        .max()
        .unwrap_or(0);

    for shot in 0..shots {
        let bitstring: String = layout
            .iter()
            .rev()
            .map(|(name, size)| {
                match result.data.get(name).and_then(|r| r.samples.get(shot)) {
                    Some(sample) => hex_to_binary(sample, *size as usize),
                    None => "0".repeat(*size as usize),
                }
            })
            .collect();
        counts.insert(bitstring, 1);
    }

    counts
}

/// Bits needed for the largest sample; at least one.
fn infer_bit_width(samples: &[String]) -> u32 {
    let max_val = samples
        .iter()
        .filter_map(|s| u128::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .max()
        .unwrap_or(0);
    (128 - max_val.leading_zeros()).max(1)
}

/// `"0x5"` with width 4 becomes `"0101"`. Non-hex input is returned unchanged.
fn hex_to_binary(hex: &str, width: usize) -> String {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    match u128::from_str_radix(digits, 16) {
        Ok(value) => format!("{value:0>width$b}"),
        Err(_) => hex.to_string(),
    }
}

#[async_trait]
impl Backend for IbmBackend {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let mut reasons = Vec::new();

        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            reasons.push(format!(
                "Circuit requires {} qubits but backend only has {}",
                circuit.num_qubits(),
                self.capabilities.num_qubits
            ));
        } else if let Err(e) = self.target.compile(circuit) {
            reasons.push(e.to_string());
        }
        if !circuit.is_measured() {
            reasons.push("Sampler jobs need at least one measurement".to_string());
        }

        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    #[instrument(skip(self, circuit), fields(backend = %self.capabilities.name))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit requires {} qubits but backend only has {}",
                circuit.num_qubits(),
                self.capabilities.num_qubits
            )));
        }

        let qasm = self.device_qasm(circuit)?;
        debug!("Submitting {} bytes of OpenQASM 3", qasm.len());

        let response = self
            .client
            .submit_sampler_job(&self.capabilities.name, &qasm, shots)
            .await?;

        let registers = circuit
            .classical_registers()
            .into_iter()
            .map(|(name, size)| (name.to_string(), size))
            .collect();
        self.jobs().insert(response.id.clone(), registers);

        info!("Submitted job {} to {}", response.id, self.capabilities.name);
        Ok(JobId(response.id))
    }

    #[instrument(skip(self), fields(backend = %self.capabilities.name))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self.client.job_status(&job_id.0).await?;
        Ok(map_status(&response))
    }

    #[instrument(skip(self), fields(backend = %self.capabilities.name))]
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let status = self.client.job_status(&job_id.0).await?;
        match map_status(&status) {
            JobStatus::Completed => {}
            JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
            JobStatus::Cancelled => return Err(HalError::JobCancelled),
            other => {
                return Err(HalError::Execution(format!(
                    "job {job_id} has no result yet ({other})"
                )));
            }
        }

        let results = self.client.job_results(&job_id.0).await?;
        let registers = self.jobs().get(&job_id.0).cloned().unwrap_or_default();
        let counts = decode_counts(&results, &registers);
        let shots = u32::try_from(counts.total_shots()).unwrap_or(u32::MAX);

        let mut result = ExecutionResult::new(counts, shots);
        if let Some(ms) = status.duration_ms() {
            result = result.with_execution_time(ms);
        }
        Ok(result)
    }

    #[instrument(skip(self), fields(backend = %self.capabilities.name))]
    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client.cancel_job(&job_id.0).await?;
        debug!("Cancelled job: {}", job_id);
        Ok(())
    }
}
