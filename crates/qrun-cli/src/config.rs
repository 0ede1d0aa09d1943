//! Configuration for the qrun CLI.
//!
//! Values are resolved with the following precedence (highest to lowest):
//! 1. Command-line flags
//! 2. Environment variables (with `QRUN_` prefix)
//! 3. Configuration file (YAML)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use qrun_hal::WaitOptions;
use qrun_ir::Circuit;
use serde::{Deserialize, Serialize};

/// Complete CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Shots per run
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Backend selector threshold; negative values fall back to 0
    #[serde(default = "default_min_qubits")]
    pub min_qubits: i64,

    /// Local backend used when no real device is requested
    #[serde(default = "default_simulator")]
    pub simulator: String,

    /// Provider searched for real devices
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Directory receiving the QASM file, images and counts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Circuit name, also the stem of the output files
    #[serde(default = "default_circuit_name")]
    pub circuit_name: String,

    /// Width of the demo circuit
    #[serde(default = "default_num_qubits")]
    pub num_qubits: u32,

    /// Seconds to wait for a job before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Milliseconds between job status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Re-prompts allowed after an unrecognised yes/no answer
    #[serde(default = "default_prompt_retries")]
    pub prompt_retries: u32,

    /// Log level when no `-v` flag is given: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_shots() -> u32 {
    1024
}

fn default_min_qubits() -> i64 {
    5
}

fn default_simulator() -> String {
    "qasm_simulator".to_string()
}

fn default_provider() -> String {
    "ibm".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_circuit_name() -> String {
    "circ".to_string()
}

fn default_num_qubits() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_prompt_retries() -> u32 {
    3
}

/// Longest accepted job wait: one week.
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            shots: default_shots(),
            min_qubits: default_min_qubits(),
            simulator: default_simulator(),
            provider: default_provider(),
            output_dir: default_output_dir(),
            circuit_name: default_circuit_name(),
            num_qubits: default_num_qubits(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            prompt_retries: default_prompt_retries(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// File (or defaults) with environment overrides applied. Not yet validated,
    /// since command-line flags still go on top.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading variables through `lookup`.
    pub fn load_with(
        config_file: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.merge_env(lookup)
    }

    /// Merge `QRUN_*` variables into this configuration.
    ///
    /// Only variables that are set override the current values; a set but
    /// unparsable value is an error.
    pub fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    key: key.to_string(),
                    value,
                })
        }

        if let Some(v) = lookup("QRUN_SHOTS") {
            self.shots = parse("QRUN_SHOTS", v)?;
        }
        if let Some(v) = lookup("QRUN_MIN_QUBITS") {
            self.min_qubits = parse("QRUN_MIN_QUBITS", v)?;
        }
        if let Some(v) = lookup("QRUN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("QRUN_SIMULATOR") {
            self.simulator = v;
        }
        if let Some(v) = lookup("QRUN_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = lookup("QRUN_TIMEOUT") {
            self.timeout_secs = parse("QRUN_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("QRUN_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse("QRUN_POLL_INTERVAL_MS", v)?;
        }
        if let Some(v) = lookup("QRUN_PROMPT_RETRIES") {
            self.prompt_retries = parse("QRUN_PROMPT_RETRIES", v)?;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shots == 0 {
            return Err(ConfigError::Validation(
                "shots must be greater than 0".to_string(),
            ));
        }
        if self.num_qubits < Circuit::DEMO_MIN_QUBITS {
            return Err(ConfigError::Validation(format!(
                "num_qubits must be at least {}",
                Circuit::DEMO_MIN_QUBITS
            )));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.prompt_retries == 0 {
            return Err(ConfigError::Validation(
                "prompt_retries must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.circuit_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "circuit_name must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Timeout and poll interval for the job wait.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Cannot parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.shots, 1024);
        assert_eq!(config.min_qubits, 5);
        assert_eq!(config.simulator, "qasm_simulator");
        assert_eq!(config.provider, "ibm");
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.circuit_name, "circ");
        assert_eq!(config.prompt_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml_ng::from_str("shots: 2048\nmin_qubits: -1\n").unwrap();
        assert_eq!(config.shots, 2048);
        assert_eq!(config.min_qubits, -1);
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.simulator, "qasm_simulator");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .merge_env(env(&[
                ("QRUN_SHOTS", "4096"),
                ("QRUN_MIN_QUBITS", "0"),
                ("QRUN_SIMULATOR", "statevector_simulator"),
                ("QRUN_OUTPUT_DIR", "/tmp/out"),
                ("QRUN_TIMEOUT", "30"),
            ]))
            .unwrap();
        assert_eq!(config.shots, 4096);
        assert_eq!(config.min_qubits, 0);
        assert_eq!(config.simulator, "statevector_simulator");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = Config::default()
            .merge_env(env(&[("QRUN_SHOTS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref key, .. } if key == "QRUN_SHOTS"));
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let cases: [fn(&mut Config); 5] = [
            |c| c.shots = 0,
            |c| c.num_qubits = 0,
            |c| c.prompt_retries = 0,
            |c| c.poll_interval_ms = 0,
            |c| c.timeout_secs = 0,
        ];
        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_validate_demo_width() {
        let narrow = Config {
            num_qubits: 4,
            ..Config::default()
        };
        let err = narrow.validate().unwrap_err();
        assert!(err.to_string().contains("at least 5"), "{err}");

        let wide = Config {
            num_qubits: 7,
            ..Config::default()
        };
        assert!(wide.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let huge = Config {
            timeout_secs: u64::MAX,
            ..Config::default()
        };
        assert!(matches!(huge.validate(), Err(ConfigError::Validation(_))));

        let week = Config {
            timeout_secs: MAX_TIMEOUT_SECS,
            ..Config::default()
        };
        assert!(week.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "loud".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wait_options() {
        let config = Config {
            timeout_secs: 5,
            poll_interval_ms: 20,
            ..Config::default()
        };
        let wait = config.wait_options();
        assert_eq!(wait.timeout, Duration::from_secs(5));
        assert_eq!(wait.poll_interval, Duration::from_millis(20));
    }
}
