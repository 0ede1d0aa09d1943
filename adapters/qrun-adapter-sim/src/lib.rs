//! qrun Local Statevector Simulator
//!
//! A local provider with two backends, `qasm_simulator` (counts) and
//! `statevector_simulator` (counts plus final amplitudes). Simulation is a
//! dense statevector, so memory doubles with every qubit.
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//!
//! # Example
//!
//! ```ignore
//! use qrun_adapter_sim::SimulatorProvider;
//! use qrun_hal::{CancelToken, Provider, RunOptions, run};
//! use qrun_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = SimulatorProvider::new();
//!     let backend = provider.backend("qasm_simulator").await?;
//!
//!     let circuit = Circuit::bell()?;
//!     let outcome = run(&circuit, backend.as_ref(), &RunOptions::default(), &CancelToken::new()).await?;
//!
//!     // Expect ~50% |00⟩ and ~50% |11⟩
//!     println!("Results: {:?}", outcome.result.counts);
//!     Ok(())
//! }
//! ```

mod execution;
mod provider;
mod simulator;
mod statevector;

pub use provider::{PROVIDER_NAME, SimulatorProvider, register};
pub use simulator::{
    DEFAULT_MAX_QUBITS, DEFAULT_MAX_SHOTS, QASM_SIMULATOR, STATEVECTOR_SIMULATOR, SimulatorBackend,
};
