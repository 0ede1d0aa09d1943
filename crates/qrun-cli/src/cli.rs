//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, ConfigError};
use crate::prompt::Answer;

/// qrun - run a demo quantum circuit on a simulator or the least busy device
#[derive(Parser, Debug)]
#[command(name = "qrun")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default `run` command
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, run and render the demo circuit (the default)
    Run(RunArgs),

    /// List a provider's backends and the one the selector would pick
    Backends(BackendsArgs),
}

impl Cli {
    /// The command to execute; no subcommand means `run`.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Run(self.run))
    }

    /// Defaults, then the config file, then `QRUN_*` variables, then flags.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        self.resolve_config_with(|key| std::env::var(key).ok())
    }

    /// Like [`Cli::resolve_config`], reading variables through `lookup`.
    pub fn resolve_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        let mut config = Config::load_with(self.config.as_deref(), lookup)?;
        match &self.command {
            Some(Commands::Run(args)) => args.apply(&mut config),
            Some(Commands::Backends(args)) => args.apply(&mut config),
            None => self.run.apply(&mut config),
        }
        config.validate()?;
        Ok(config)
    }
}

/// Options of the interactive run.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Number of shots
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Only consider devices with more than this many qubits
    #[arg(long, allow_negative_numbers = true)]
    pub min_qubits: Option<i64>,

    /// Directory for the QASM file, images and counts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seconds to wait for the job
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Circuit name, also the stem of the output files
    #[arg(short, long)]
    pub name: Option<String>,

    /// Simulator used when no real device is requested
    #[arg(long)]
    pub simulator: Option<String>,

    /// Answer "yes" to the real-backend question
    #[arg(long, conflicts_with = "no_real")]
    pub yes_real: bool,

    /// Answer "no" to the real-backend question
    #[arg(long)]
    pub no_real: bool,

    /// Answer "yes" to the measurement question
    #[arg(long, conflicts_with = "no_measure")]
    pub measure: bool,

    /// Answer "no" to the measurement question
    #[arg(long)]
    pub no_measure: bool,
}

impl RunArgs {
    /// Override `config` with every flag that was given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        if let Some(min_qubits) = self.min_qubits {
            config.min_qubits = min_qubits;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(name) = &self.name {
            config.circuit_name = name.clone();
        }
        if let Some(simulator) = &self.simulator {
            config.simulator = simulator.clone();
        }
    }

    /// Pre-answered real-backend question, if any.
    pub fn real_answer(&self) -> Option<Answer> {
        flag_answer(self.yes_real, self.no_real)
    }

    /// Pre-answered measurement question, if any.
    pub fn measure_answer(&self) -> Option<Answer> {
        flag_answer(self.measure, self.no_measure)
    }
}

fn flag_answer(yes: bool, no: bool) -> Option<Answer> {
    match (yes, no) {
        (true, _) => Some(Answer::Yes),
        (_, true) => Some(Answer::No),
        _ => None,
    }
}

/// Options of `qrun backends`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct BackendsArgs {
    /// Provider to list (defaults to the configured one)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Selector threshold (defaults to the configured one)
    #[arg(long, allow_negative_numbers = true)]
    pub min_qubits: Option<i64>,
}

impl BackendsArgs {
    /// Override `config` with every flag that was given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(min_qubits) = self.min_qubits {
            config.min_qubits = min_qubits;
        }
    }
}
