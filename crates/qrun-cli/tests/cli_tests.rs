//! CLI argument parsing, configuration precedence and the end-to-end run.

// ============================================================================
// Clap argument parsing
// ============================================================================

mod clap_parsing {
    use clap::Parser;
    use qrun_cli::cli::{Cli, Commands};
    use qrun_cli::prompt::Answer;
    use std::path::PathBuf;

    #[test]
    fn test_no_args_is_run() {
        let cli = Cli::try_parse_from(["qrun"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        match cli.into_command() {
            Commands::Run(args) => {
                assert!(args.shots.is_none());
                assert!(args.real_answer().is_none());
                assert!(args.measure_answer().is_none());
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_top_level_run_flags() {
        let cli = Cli::try_parse_from([
            "qrun",
            "-vv",
            "--shots",
            "2048",
            "--min-qubits",
            "-3",
            "-o",
            "out",
            "--no-real",
            "--measure",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.into_command() else {
            panic!("expected run");
        };
        assert_eq!(args.shots, Some(2048));
        assert_eq!(args.min_qubits, Some(-3));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.real_answer(), Some(Answer::No));
        assert_eq!(args.measure_answer(), Some(Answer::Yes));
    }

    #[test]
    fn test_run_subcommand() {
        let cli =
            Cli::try_parse_from(["qrun", "run", "--name", "bell", "--timeout", "30", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.into_command() else {
            panic!("expected run");
        };
        assert_eq!(args.name.as_deref(), Some("bell"));
        assert_eq!(args.timeout, Some(30));
    }

    #[test]
    fn test_backends_subcommand() {
        let cli = Cli::try_parse_from(["qrun", "backends", "--provider", "sim", "--min-qubits", "0"])
            .unwrap();
        let Commands::Backends(args) = cli.into_command() else {
            panic!("expected backends");
        };
        assert_eq!(args.provider.as_deref(), Some("sim"));
        assert_eq!(args.min_qubits, Some(0));
    }

    #[test]
    fn test_conflicting_answers_rejected() {
        assert!(Cli::try_parse_from(["qrun", "--yes-real", "--no-real"]).is_err());
        assert!(Cli::try_parse_from(["qrun", "--measure", "--no-measure"]).is_err());
    }

    #[test]
    fn test_run_flags_conflict_with_other_subcommand() {
        assert!(Cli::try_parse_from(["qrun", "--shots", "10", "backends"]).is_err());
    }

    #[test]
    fn test_invalid_shots_rejected() {
        assert!(Cli::try_parse_from(["qrun", "--shots", "many"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["qrun", "teleport"]).is_err());
    }
}

// ============================================================================
// Configuration precedence
// ============================================================================

mod config_precedence {
    use clap::Parser;
    use qrun_cli::cli::Cli;
    use qrun_cli::config::ConfigError;
    use std::io::Write;
    use std::path::PathBuf;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let cli = Cli::try_parse_from(["qrun"]).unwrap();
        let config = cli.resolve_config_with(no_env).unwrap();
        assert_eq!(config.shots, 1024);
        assert_eq!(config.min_qubits, 5);
    }

    #[test]
    fn test_file_then_env_then_flags() {
        let file = config_file("shots: 100\nmin_qubits: 2\ncircuit_name: fromfile\ntimeout_secs: 9\n");
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["qrun", "--config", path]).unwrap();
        let config = cli.resolve_config_with(no_env).unwrap();
        assert_eq!(config.shots, 100);
        assert_eq!(config.circuit_name, "fromfile");

        let env = |key: &str| match key {
            "QRUN_SHOTS" => Some("200".to_string()),
            "QRUN_MIN_QUBITS" => Some("3".to_string()),
            _ => None,
        };
        let config = cli.resolve_config_with(env).unwrap();
        assert_eq!(config.shots, 200);
        assert_eq!(config.min_qubits, 3);
        assert_eq!(config.timeout_secs, 9);

        let cli = Cli::try_parse_from(["qrun", "--config", path, "--shots", "300", "-o", "/tmp/q"])
            .unwrap();
        let config = cli.resolve_config_with(env).unwrap();
        assert_eq!(config.shots, 300);
        assert_eq!(config.min_qubits, 3);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/q"));
        assert_eq!(config.circuit_name, "fromfile");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cli = Cli::try_parse_from(["qrun", "--shots", "0"]).unwrap();
        assert!(matches!(
            cli.resolve_config_with(no_env),
            Err(ConfigError::Validation(_))
        ));

        let file = config_file("prompt_retries: 0\n");
        let cli = Cli::try_parse_from(["qrun", "-c", file.path().to_str().unwrap()]).unwrap();
        assert!(matches!(
            cli.resolve_config_with(no_env),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let cli = Cli::try_parse_from(["qrun", "-c", "/nonexistent/qrun.yaml"]).unwrap();
        assert!(matches!(
            cli.resolve_config_with(no_env),
            Err(ConfigError::Io { .. })
        ));

        let file = config_file("shots: [1, 2\n");
        let cli = Cli::try_parse_from(["qrun", "-c", file.path().to_str().unwrap()]).unwrap();
        assert!(matches!(
            cli.resolve_config_with(no_env),
            Err(ConfigError::Parse { .. })
        ));
    }
}

// ============================================================================
// End-to-end run on the local simulator
// ============================================================================

mod run_flow {
    use qrun_cli::cli::RunArgs;
    use qrun_cli::commands::run;
    use qrun_cli::config::Config;
    use qrun_cli::prompt::{LineSource, PromptError, Prompter};
    use std::io::Cursor;

    fn config(dir: &std::path::Path) -> Config {
        Config {
            output_dir: dir.to_path_buf(),
            poll_interval_ms: 1,
            timeout_secs: 30,
            ..Config::default()
        }
    }

    fn prompter(input: &str) -> Prompter<LineSource<Cursor<Vec<u8>>, Vec<u8>>> {
        Prompter::from_lines(Cursor::new(input.as_bytes().to_vec()), Vec::new(), 3)
    }

    #[tokio::test]
    async fn test_simulator_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut prompter = prompter("n\ny\n");

        let outcome = run::execute(&config, &RunArgs::default(), &mut prompter, &qrun_cli::registry())
            .await
            .unwrap();

        assert_eq!(outcome.backend, "qasm_simulator");
        assert_eq!(outcome.result.counts.total_shots(), 1024);
        assert!(outcome.circuit.is_measured());
        // Only qubits 3 and 4 are touched; clbits 0..=2 stay zero.
        for (bitstring, _) in outcome.result.counts.iter() {
            assert_eq!(bitstring.len(), 5);
            assert_eq!(&bitstring[2..], "000");
        }

        for file in ["circ.qasm", "histogram.svg", "circ.svg", "circ_counts.json"] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }

        let qasm = std::fs::read_to_string(dir.path().join("circ.qasm")).unwrap();
        let parsed = qrun_qasm::parse(&qasm).unwrap();
        assert_eq!(parsed.instructions(), outcome.circuit.instructions());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("circ_counts.json")).unwrap())
                .unwrap();
        assert_eq!(json["shots"], 1024);

        let printed = String::from_utf8(prompter.into_output()).unwrap();
        assert!(printed.contains(run::REAL_BACKEND_QUESTION));
        assert!(printed.contains(run::MEASURE_QUESTION));
    }

    #[tokio::test]
    async fn test_unmeasured_run_on_statevector_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            simulator: "statevector_simulator".into(),
            circuit_name: "raw".into(),
            shots: 10,
            ..config(dir.path())
        };
        let args = RunArgs {
            no_real: true,
            no_measure: true,
            ..RunArgs::default()
        };
        let mut prompter = prompter("");

        let outcome = run::execute(&config, &args, &mut prompter, &qrun_cli::registry())
            .await
            .unwrap();

        assert!(!outcome.circuit.is_measured());
        assert_eq!(outcome.result.counts.get("00000"), 10);
        assert!(outcome.result.statevector.is_some());
        assert!(dir.path().join("raw.qasm").exists());
        // Both questions were answered by flags.
        assert!(prompter.into_output().is_empty());
    }

    #[tokio::test]
    async fn test_shot_limit_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            shots: 10_000,
            ..config(dir.path())
        };
        let mut prompter = prompter("n\ny\n");

        let err = run::execute(&config, &RunArgs::default(), &mut prompter, &qrun_cli::registry())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("8192"), "{err}");
        assert!(!dir.path().join("circ.qasm").exists());
    }

    #[tokio::test]
    async fn test_unknown_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            simulator: "fake_simulator".into(),
            ..config(dir.path())
        };
        let args = RunArgs {
            no_real: true,
            ..RunArgs::default()
        };
        let mut prompter = prompter("");

        assert!(
            run::execute(&config, &args, &mut prompter, &qrun_cli::registry())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_prompt_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut prompter = prompter("a\nb\nc\nd\n");

        let err = run::execute(&config, &RunArgs::default(), &mut prompter, &qrun_cli::registry())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PromptError>(),
            Some(PromptError::RetriesExhausted { attempts: 4 })
        ));
    }
}
