//! Run command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use qrun_hal::{
    Backend, JobId, JobStatus, Provider, ProviderConfig, ProviderRegistry, RunOutcome,
    select_backend,
};

use crate::cli::RunArgs;
use crate::config::Config;
use crate::context::ExecutionContext;
use crate::prompt::{Answer, AnswerSource, Prompter};
use crate::render;

pub const REAL_BACKEND_QUESTION: &str = "Do you want to use a real backend?";
pub const MEASURE_QUESTION: &str =
    "Do you want to measure this circuit? WARNING: results will be invalid otherwise!";

/// Execute the interactive run.
///
/// Questions already answered by `args` are not asked.
pub async fn execute<S: AnswerSource>(
    config: &Config,
    args: &RunArgs,
    prompter: &mut Prompter<S>,
    registry: &ProviderRegistry,
) -> Result<RunOutcome> {
    let real = match args.real_answer() {
        Some(answer) => answer,
        None => prompter.ask(REAL_BACKEND_QUESTION)?,
    };
    let backend = resolve_backend(registry, config, real).await?;
    println!(
        "\nThe backend is set to: {}\n",
        style(backend.name()).yellow().bold()
    );

    let measure = match args.measure_answer() {
        Some(answer) => answer,
        None => prompter.ask(MEASURE_QUESTION)?,
    };
    if !measure.is_yes() {
        println!(
            "{} The circuit will not be measured; results will be invalid!",
            style("⚠").yellow().bold()
        );
    }
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid spinner template")?,
    );

    let observer = spinner.clone();
    let wait = config
        .wait_options()
        .with_observer(move |job_id: &JobId, status: &JobStatus| {
            observer.set_message(format!("Job {job_id}: {status}"));
        });
    let ctx = ExecutionContext::new(backend, config, measure.is_yes()).with_wait(wait);

    let circuit = ctx.build_circuit()?;
    println!(
        "{} Executing circuit '{}' ({} qubits, depth {}) on {} with {} shots",
        style("→").cyan().bold(),
        style(circuit.name()).green(),
        circuit.num_qubits(),
        circuit.depth(),
        style(ctx.backend_name()).yellow(),
        ctx.shots
    );

    let cancel = ctx.cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling job");
            cancel.cancel();
        }
    });

    spinner.set_message("Submitting job...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let outcome = ctx.execute(&circuit).await;
    interrupt.abort();
    spinner.finish_and_clear();
    let outcome = outcome?;

    render::print_results(&outcome.result);
    if let Some(amplitudes) = &outcome.result.statevector {
        render::print_statevector(amplitudes);
    }

    println!();
    ctx.write_outputs(&outcome)?;
    let out = &ctx.outputs;
    println!("  QASM written to {}", style(out.qasm.display()).green());
    println!("  Histogram written to {}", style(out.histogram.display()).green());
    println!("  Circuit drawing written to {}", style(out.diagram.display()).green());
    println!("  Counts written to {}", style(out.counts.display()).green());

    println!("\n{}", style("All done!").green().bold());
    Ok(outcome)
}

/// The least busy device of the configured provider, or the configured simulator.
pub async fn resolve_backend(
    registry: &ProviderRegistry,
    config: &Config,
    real: Answer,
) -> Result<Box<dyn Backend>> {
    let provider_name = match real {
        Answer::Yes => config.provider.as_str(),
        Answer::No => qrun_adapter_sim::PROVIDER_NAME,
    };
    let provider = registry.get_provider(provider_name, &ProviderConfig::new())?;

    let backend_name = match real {
        Answer::Yes => {
            let selected = select_backend(provider.as_ref(), config.min_qubits)
                .await
                .with_context(|| format!("Cannot select a {provider_name} backend"))?;
            println!(
                "The best real backend at {} is: {}",
                provider_name,
                style(&selected.name).cyan()
            );
            selected.name
        }
        Answer::No => config.simulator.clone(),
    };

    Ok(provider.backend(&backend_name).await?)
}
