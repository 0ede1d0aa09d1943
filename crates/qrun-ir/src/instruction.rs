//! One step of a circuit: a gate, measurement, reset or barrier with its operands.

use serde::{Deserialize, Serialize};

use crate::gate::StandardGate;
use crate::qubit::{ClbitId, QubitId};

/// What an instruction does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Apply a standard gate.
    Gate(StandardGate),
    /// Measure `qubits[i]` into `clbits[i]`.
    Measure,
    /// Project the qubits back to |0⟩.
    Reset,
    /// Scheduling fence; no effect on the state.
    Barrier,
}

/// An operation together with the bits it touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstructionKind,
    /// Operand qubits, in gate order (controls first).
    pub qubits: Vec<QubitId>,
    /// Clbits written; empty except for measurements.
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Gate over `qubits`. Arity is checked when the instruction is pushed.
    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Gate on one qubit.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Gate on two qubits, `q1` first.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Measure `qubit` into `clbit`.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Barrier across `qubits`.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    pub fn is_reset(&self) -> bool {
        matches!(self.kind, InstructionKind::Reset)
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// The gate, for gate instructions.
    pub fn as_gate(&self) -> Option<&StandardGate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// `(qubit, clbit)` pairs written by a measurement; empty for anything else.
    pub fn measured_pairs(&self) -> impl Iterator<Item = (QubitId, ClbitId)> + '_ {
        let pairs = if self.is_measure() {
            self.qubits.len().min(self.clbits.len())
        } else {
            0
        };
        self.qubits
            .iter()
            .copied()
            .zip(self.clbits.iter().copied())
            .take(pairs)
    }

    /// OpenQASM keyword of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::single_qubit_gate(StandardGate::H, QubitId(0));
        assert!(inst.is_gate());
        assert_eq!(inst.qubits.len(), 1);
        assert_eq!(inst.name(), "h");
        assert_eq!(inst.as_gate(), Some(&StandardGate::H));
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::measure(QubitId(0), ClbitId(0));
        assert!(inst.is_measure());
        assert_eq!(inst.qubits, vec![QubitId(0)]);
        assert_eq!(inst.clbits, vec![ClbitId(0)]);
        assert!(inst.as_gate().is_none());
    }

    #[test]
    fn test_measured_pairs() {
        let mut inst = Instruction::measure(QubitId(2), ClbitId(0));
        inst.qubits.push(QubitId(3));
        inst.clbits.push(ClbitId(1));
        let pairs: Vec<_> = inst.measured_pairs().collect();
        assert_eq!(pairs, vec![(QubitId(2), ClbitId(0)), (QubitId(3), ClbitId(1))]);

        let reset = Instruction::reset(QubitId(0));
        assert_eq!(reset.measured_pairs().count(), 0);
    }

    #[test]
    fn test_barrier_instruction() {
        let inst = Instruction::barrier([QubitId(0), QubitId(1), QubitId(2)]);
        assert!(inst.is_barrier());
        assert_eq!(inst.qubits.len(), 3);
        assert_eq!(inst.name(), "barrier");
    }
}
