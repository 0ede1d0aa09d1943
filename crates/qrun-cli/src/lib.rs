//! Library side of the `qrun` binary.
//!
//! The binary is a thin `main` over these modules, so the interactive flow
//! can be driven from tests with scripted input.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod prompt;
pub mod render;

use qrun_hal::ProviderRegistry;

/// Registry with the local simulator (`"sim"`) and IBM Quantum (`"ibm"`).
pub fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    qrun_adapter_sim::register(&mut registry);
    qrun_adapter_ibm::register(&mut registry);
    registry
}
