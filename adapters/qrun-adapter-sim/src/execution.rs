//! Turning a circuit into counts.
//!
//! Circuits whose measurements are all terminal are evolved once and the
//! final distribution is sampled `shots` times. Circuits with resets, or with
//! operations on an already-measured qubit, are simulated shot by shot with
//! projective collapse.

use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use qrun_hal::Counts;
use qrun_ir::{Circuit, Instruction, InstructionKind};

use crate::statevector::{Statevector, sample_index};

/// Simulate `shots` executions of `circuit`.
///
/// Clbits that are never written read `0`, so an unmeasured circuit gives the
/// all-zero bit-string for every shot.
pub fn sample_counts(circuit: &Circuit, shots: u32, rng: &mut impl Rng) -> Counts {
    if needs_trajectories(circuit) {
        debug!("Simulating {} shots individually", shots);
        run_trajectories(circuit, shots, rng)
    } else {
        debug!("Sampling {} shots from the final state", shots);
        sample_final_state(circuit, shots, rng)
    }
}

/// The state after every gate, ignoring measurements and barriers.
///
/// Callers reject circuits containing resets first.
pub fn unitary_statevector(circuit: &Circuit) -> Statevector {
    let mut sv = Statevector::new(circuit.num_qubits());
    for instruction in circuit.instructions() {
        if let InstructionKind::Gate(gate) = &instruction.kind {
            sv.apply_gate(gate, &qubit_indices(instruction));
        }
    }
    sv
}

/// Whether any reset appears, or any operation follows a measurement on its qubit.
pub fn needs_trajectories(circuit: &Circuit) -> bool {
    let mut measured = FxHashSet::default();
    for instruction in circuit.instructions() {
        match instruction.kind {
            InstructionKind::Reset => return true,
            InstructionKind::Gate(_) => {
                if instruction.qubits.iter().any(|q| measured.contains(q)) {
                    return true;
                }
            }
            InstructionKind::Measure => measured.extend(instruction.qubits.iter().copied()),
            InstructionKind::Barrier => {}
        }
    }
    false
}

fn sample_final_state(circuit: &Circuit, shots: u32, rng: &mut impl Rng) -> Counts {
    let cumulative = unitary_statevector(circuit).cumulative_distribution();

    let mut outcomes: FxHashMap<usize, u64> = FxHashMap::default();
    for _ in 0..shots {
        *outcomes.entry(sample_index(&cumulative, rng)).or_insert(0) += 1;
    }

    // Later measurements into the same clbit overwrite earlier ones.
    let pairs = circuit.measurements();
    let mut counts = Counts::new();
    for (basis, n) in outcomes {
        let mut clbits = vec![false; circuit.num_clbits()];
        for &(q, c) in &pairs {
            clbits[c.0 as usize] = (basis >> q.0) & 1 == 1;
        }
        counts.insert(bitstring(&clbits), n);
    }
    counts
}

fn run_trajectories(circuit: &Circuit, shots: u32, rng: &mut impl Rng) -> Counts {
    let mut counts = Counts::new();
    for shot in 0..shots {
        let mut sv = Statevector::new(circuit.num_qubits());
        let mut clbits = vec![false; circuit.num_clbits()];

        for instruction in circuit.instructions() {
            match &instruction.kind {
                InstructionKind::Gate(gate) => sv.apply_gate(gate, &qubit_indices(instruction)),
                InstructionKind::Measure => {
                    for (q, c) in instruction.measured_pairs() {
                        clbits[c.0 as usize] = sv.measure(q.0 as usize, rng);
                    }
                }
                InstructionKind::Reset => {
                    for q in &instruction.qubits {
                        sv.reset(q.0 as usize, rng);
                    }
                }
                InstructionKind::Barrier => {}
            }
        }

        counts.insert(bitstring(&clbits), 1);
        if shot > 0 && shot % 1000 == 0 {
            debug!("Completed {} shots", shot);
        }
    }
    counts
}

fn qubit_indices(instruction: &Instruction) -> Vec<usize> {
    instruction.qubits.iter().map(|q| q.0 as usize).collect()
}

/// Highest clbit first.
fn bitstring(clbits: &[bool]) -> String {
    clbits
        .iter()
        .rev()
        .map(|&b| if b { '1' } else { '0' })
        .collect()
}
