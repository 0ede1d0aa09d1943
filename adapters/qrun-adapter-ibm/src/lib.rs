//! IBM Quantum provider for qrun.
//!
//! Talks to the IBM Quantum Cloud REST API: loads the account, lists devices
//! with their queue length, and runs circuits through the Sampler V2 primitive.
//!
//! # Authentication
//!
//! | Variables | Flow |
//! |-----------|------|
//! | `IBM_API_KEY` + `IBM_SERVICE_CRN` | IAM key exchange, then bearer token |
//! | `IBM_QUANTUM_TOKEN` | bearer token used directly |
//!
//! Missing or rejected credentials surface as `HalError::AuthenticationFailed`;
//! an unreachable service as `HalError::Connectivity`.
//!
//! # Example
//!
//! ```ignore
//! use qrun_adapter_ibm::IbmProvider;
//! use qrun_hal::{Provider, select_backend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = IbmProvider::from_env();
//!     let least_busy = select_backend(&provider, 5).await?;
//!     println!("least busy: {}", least_busy.name);
//!     Ok(())
//! }
//! ```

mod backend;
mod client;
mod error;
mod provider;
mod transpile;

pub use backend::IbmBackend;
pub use client::{BackendInfo, Credentials, DEFAULT_ENDPOINT, IbmClient};
pub use error::{IbmError, IbmResult};
pub use provider::{IbmProvider, PROVIDER_NAME, register};
