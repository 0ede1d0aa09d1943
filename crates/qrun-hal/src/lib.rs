//! qrun Hardware Abstraction Layer
//!
//! This crate provides a uniform interface to quantum backends, plus the two
//! operations every run goes through: choosing a backend and running a
//! circuit on it.
//!
//! # Overview
//!
//! - [`Provider`]: a session with a source of backends (`load_account`,
//!   `list_backends`, `backend`), created by name through [`ProviderRegistry`].
//! - [`Backend`]: job submission, status polling, results and cancellation.
//! - [`select_backend`]: least busy non-simulator backend above a qubit threshold.
//! - [`run`]: measure, submit, wait with a timeout and a [`CancelToken`], collect [`Counts`].
//!
//! # Providers
//!
//! | Provider | Crate | Authentication |
//! |----------|-------|----------------|
//! | Local simulator | `qrun-adapter-sim` | None |
//! | IBM Quantum | `qrun-adapter-ibm` | `IBM_API_KEY` + `IBM_SERVICE_CRN`, or `IBM_QUANTUM_TOKEN` |
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use qrun_hal::{CancelToken, Provider, RunOptions, run, select_backend};
//! use qrun_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = qrun_adapter_ibm::IbmProvider::from_env();
//!
//!     // Least busy real device with more than 5 qubits
//!     let descriptor = select_backend(&provider, 5).await?;
//!     let backend = provider.backend(&descriptor.name).await?;
//!
//!     let circuit = Circuit::bell()?;
//!     let outcome = run(&circuit, backend.as_ref(), &RunOptions::default(), &CancelToken::new()).await?;
//!
//!     if let Some((bitstring, count)) = outcome.result.counts.most_frequent() {
//!         println!("Most frequent: {} ({} times)", bitstring, count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cancel;
pub mod capability;
pub mod error;
pub mod job;
pub mod provider;
pub mod registry;
pub mod result;
pub mod runner;
pub mod selector;

pub use backend::{Backend, StatusObserver, ValidationResult, WaitOptions};
pub use cancel::CancelToken;
pub use capability::Capabilities;
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use provider::{BackendConfiguration, BackendDescriptor, BackendStatus, Provider};
pub use registry::{ProviderConfig, ProviderRegistry};
pub use result::{Amplitude, Counts, ExecutionResult};
pub use runner::{RunOptions, RunOutcome, run};
pub use selector::{QubitRequirement, least_busy, select_backend, select_from};
