//! End-to-end runs through the circuit runner on the local simulators.

use std::time::Duration;

use qrun_adapter_sim::{SimulatorBackend, SimulatorProvider};
use qrun_hal::{CancelToken, HalError, Provider, RunOptions, WaitOptions, run};
use qrun_ir::Circuit;

fn options(shots: u32, measure: bool) -> RunOptions {
    RunOptions {
        shots,
        measure,
        wait: WaitOptions::new(Duration::from_secs(30), Duration::from_millis(5)),
    }
}

#[tokio::test]
async fn test_bell_counts_only_correlated() {
    let provider = SimulatorProvider::new();
    let backend = provider.backend("qasm_simulator").await.unwrap();

    let outcome = run(
        &Circuit::bell().unwrap(),
        backend.as_ref(),
        &options(1024, true),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    let counts = &outcome.result.counts;
    assert_eq!(counts.total_shots(), 1024);
    for (bitstring, _) in counts.iter() {
        assert!(bitstring == "00" || bitstring == "11", "unexpected {bitstring}");
    }
    assert_eq!(outcome.backend, "qasm_simulator");
}

#[tokio::test]
async fn test_demo_circuit_totals_shots() {
    let backend = SimulatorBackend::new();
    let circuit = Circuit::demo("circ", 5).unwrap();

    let outcome = run(&circuit, &backend, &options(1024, true), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.result.counts.total_shots(), 1024);
    assert_eq!(outcome.circuit.measurements().len(), 5);
    // Qubits 0-2 are untouched, so their bits are always 0.
    for (bitstring, _) in outcome.result.counts.iter() {
        assert_eq!(bitstring.len(), 5);
        assert!(bitstring.ends_with("000"));
    }
}

#[tokio::test]
async fn test_unmeasured_circuit_reads_all_zero() {
    let backend = SimulatorBackend::new();
    let circuit = Circuit::demo("circ", 5).unwrap();

    let outcome = run(&circuit, &backend, &options(256, false), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.result.counts.get("00000"), 256);
    assert!(!outcome.circuit.is_measured());
}

#[tokio::test]
async fn test_shot_limit_exceeded() {
    let backend = SimulatorBackend::new();
    let err = run(
        &Circuit::bell().unwrap(),
        &backend,
        &options(8193, true),
        &CancelToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        HalError::ShotLimitExceeded {
            requested: 8193,
            max: 8192
        }
    ));
}

#[tokio::test]
async fn test_cancel_while_queued() {
    let backend = SimulatorBackend::new().with_queue_delay(Duration::from_secs(60));
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = run(&Circuit::bell().unwrap(), &backend, &options(100, true), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::JobCancelled));
    assert_eq!(backend.pending_jobs(), 0);
}

#[tokio::test]
async fn test_timeout_while_queued() {
    let backend = SimulatorBackend::new().with_queue_delay(Duration::from_secs(60));
    let opts = RunOptions {
        wait: WaitOptions::new(Duration::from_millis(100), Duration::from_millis(10)),
        ..options(100, true)
    };

    let err = run(&Circuit::bell().unwrap(), &backend, &opts, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Timeout(_)));
}

#[tokio::test]
async fn test_unbounded_timeout_still_completes() {
    let backend = SimulatorBackend::new();
    let opts = RunOptions {
        wait: WaitOptions::new(Duration::from_secs(u64::MAX), Duration::from_millis(1)),
        ..options(64, true)
    };

    let outcome = run(&Circuit::bell().unwrap(), &backend, &opts, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.result.counts.total_shots(), 64);
}

#[tokio::test]
async fn test_statevector_outcome() {
    let provider = SimulatorProvider::new();
    let backend = provider.backend("statevector_simulator").await.unwrap();

    let outcome = run(
        &Circuit::ghz(3).unwrap(),
        backend.as_ref(),
        &options(512, true),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    let amplitudes = outcome.result.statevector.unwrap();
    assert_eq!(amplitudes.len(), 2);
    assert_eq!(amplitudes[0].basis, "000");
    assert_eq!(amplitudes[1].basis, "111");
}
