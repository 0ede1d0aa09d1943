//! qrun command-line interface.
//!
//! ```text
//! $ qrun
//! Do you want to use a real backend? (y/n): n
//!
//! The backend is set to: qasm_simulator
//!
//! Do you want to measure this circuit? WARNING: results will be invalid otherwise! (y/n): y
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use qrun_cli::cli::{Cli, Commands};
use qrun_cli::commands::{backends, run};
use qrun_cli::prompt::Prompter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Setup logging
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_env("QRUN_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let registry = qrun_cli::registry();

    // Execute command
    let result = match cli.into_command() {
        Commands::Run(args) => {
            let mut prompter = Prompter::stdio(config.prompt_retries);
            run::execute(&config, &args, &mut prompter, &registry)
                .await
                .map(|_| ())
        }
        Commands::Backends(_) => backends::execute(&config, &registry).await.map(|_| ()),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
