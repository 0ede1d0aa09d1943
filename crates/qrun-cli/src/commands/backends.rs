//! Backends command implementation.

use anyhow::{Context, Result};
use console::style;

use qrun_hal::{
    BackendDescriptor, HalError, Provider, ProviderConfig, ProviderRegistry, QubitRequirement,
    select_from,
};

use crate::config::Config;

/// Execute the backends command.
///
/// Returns the backend the selector picked, if any qualified.
pub async fn execute(config: &Config, registry: &ProviderRegistry) -> Result<Option<String>> {
    let provider = registry.get_provider(&config.provider, &ProviderConfig::new())?;
    provider
        .load_account()
        .await
        .with_context(|| format!("Cannot load the {} account", config.provider))?;
    let backends = provider.list_backends().await?;

    println!(
        "{} Available {} backends:\n",
        style("qrun").cyan().bold(),
        style(&config.provider).bold()
    );

    let requirement = QubitRequirement::from_min_qubits(config.min_qubits);
    let chosen = match select_from(&backends, requirement) {
        Ok(descriptor) => Some(descriptor.name),
        Err(HalError::NoAvailableBackend(reason)) => {
            println!("  {} {}\n", style("!").yellow().bold(), reason);
            None
        }
        Err(e) => return Err(e.into()),
    };

    for line in table(&backends, chosen.as_deref()) {
        println!("  {line}");
    }

    if let Some(name) = &chosen {
        println!(
            "\n  {} least busy backend: {}",
            style("→").cyan().bold(),
            style(name).green().bold()
        );
    }

    Ok(chosen)
}

/// Plain-text table of `backends`, with `*` marking `chosen`.
pub fn table(backends: &[BackendDescriptor], chosen: Option<&str>) -> Vec<String> {
    let width = backends
        .iter()
        .map(|b| b.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut lines = Vec::with_capacity(backends.len() + 1);
    lines.push(format!(
        "  {:<width$}  {:>6}  {:<9}  {:>7}  STATUS",
        "NAME", "QUBITS", "KIND", "PENDING"
    ));
    for backend in backends {
        let config = backend.configuration();
        let status = backend.status();
        let marker = if chosen == Some(backend.name.as_str()) { '*' } else { ' ' };
        let state = if status.operational {
            status.status_msg.clone()
        } else {
            format!("offline ({})", status.status_msg)
        };
        lines.push(format!(
            "{marker} {:<width$}  {:>6}  {:<9}  {:>7}  {state}",
            backend.name,
            config.num_qubits,
            if config.simulator { "simulator" } else { "device" },
            status.pending_jobs,
        ));
    }
    lines
}
