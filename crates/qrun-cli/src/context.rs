//! Everything one run needs, passed explicitly from command to command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qrun_hal::{Backend, CancelToken, HalError, HalResult, RunOptions, RunOutcome, WaitOptions};
use qrun_ir::Circuit;
use tracing::{debug, info};

use crate::config::Config;
use crate::render::{self, DIAGRAM_FOLD};

/// File name of the histogram image.
pub const HISTOGRAM_FILE: &str = "histogram.svg";

/// Files produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    /// `<name>.qasm`
    pub qasm: PathBuf,
    /// `histogram.svg`
    pub histogram: PathBuf,
    /// `<name>.svg`
    pub diagram: PathBuf,
    /// `<name>_counts.json`
    pub counts: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        let dir = dir.into();
        Self {
            qasm: dir.join(format!("{name}.qasm")),
            histogram: dir.join(HISTOGRAM_FILE),
            diagram: dir.join(format!("{name}.svg")),
            counts: dir.join(format!("{name}_counts.json")),
            dir,
        }
    }
}

/// The chosen backend plus the run settings.
pub struct ExecutionContext {
    pub backend: Box<dyn Backend>,
    pub shots: u32,
    pub measure: bool,
    pub circuit_name: String,
    pub num_qubits: u32,
    pub outputs: OutputPaths,
    pub wait: WaitOptions,
    pub cancel: CancelToken,
}

impl ExecutionContext {
    /// Build a context from resolved configuration.
    pub fn new(backend: Box<dyn Backend>, config: &Config, measure: bool) -> Self {
        Self {
            backend,
            shots: config.shots,
            measure,
            circuit_name: config.circuit_name.clone(),
            num_qubits: config.num_qubits,
            outputs: OutputPaths::new(&config.output_dir, &config.circuit_name),
            wait: config.wait_options(),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the wait options, e.g. to attach a progress observer.
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Name of the backend jobs go to.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            shots: self.shots,
            measure: self.measure,
            wait: self.wait.clone(),
        }
    }

    /// The demo circuit at the configured name and width.
    pub fn build_circuit(&self) -> HalResult<Circuit> {
        Circuit::demo(&self.circuit_name, self.num_qubits)
            .map_err(|e| HalError::InvalidCircuit(e.to_string()))
    }

    /// Run `circuit` on the context's backend.
    pub async fn execute(&self, circuit: &Circuit) -> HalResult<RunOutcome> {
        debug!(
            backend = self.backend_name(),
            shots = self.shots,
            measure = self.measure,
            "Executing circuit"
        );
        qrun_hal::run(circuit, self.backend.as_ref(), &self.run_options(), &self.cancel).await
    }

    /// Write the QASM source, histogram, diagram and counts of `outcome`.
    pub fn write_outputs(&self, outcome: &RunOutcome) -> Result<()> {
        let out = &self.outputs;
        std::fs::create_dir_all(&out.dir)
            .with_context(|| format!("Cannot create output directory {}", out.dir.display()))?;

        qrun_qasm::write_qasm_file(&outcome.circuit, &out.dir, &self.circuit_name)?;

        write(&out.histogram, render::histogram_svg(&outcome.result.counts))?;
        write(
            &out.diagram,
            render::circuit_svg(&outcome.circuit, DIAGRAM_FOLD),
        )?;
        write(&out.counts, render::counts_json(&outcome.result)?)?;

        info!(dir = %out.dir.display(), "Outputs written");
        Ok(())
    }
}

fn write(path: &Path, contents: String) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Cannot write {}", path.display()))
}
