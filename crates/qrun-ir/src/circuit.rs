//! High-level circuit builder API.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit.
///
/// Registers are declared first and are frozen as soon as the first
/// instruction is appended; from then on the circuit only grows by
/// appending instructions. Deserialized circuits go through the same
/// operand checks as [`Circuit::push`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CircuitData")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in declaration order.
    qubits: Vec<Qubit>,
    /// Classical bits in declaration order.
    clbits: Vec<Clbit>,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

/// Unchecked serialized form of a [`Circuit`].
#[derive(Deserialize)]
struct CircuitData {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    instructions: Vec<Instruction>,
}

impl TryFrom<CircuitData> for Circuit {
    type Error = IrError;

    fn try_from(data: CircuitData) -> IrResult<Self> {
        for (position, qubit) in data.qubits.iter().enumerate() {
            if qubit.id.0 as usize != position {
                return Err(IrError::BitOutOfOrder {
                    bit: qubit.id.to_string(),
                    position,
                });
            }
        }
        for (position, clbit) in data.clbits.iter().enumerate() {
            if clbit.id.0 as usize != position {
                return Err(IrError::BitOutOfOrder {
                    bit: clbit.id.to_string(),
                    position,
                });
            }
        }

        let mut circuit = Circuit {
            name: data.name,
            qubits: data.qubits,
            clbits: data.clbits,
            instructions: Vec::with_capacity(data.instructions.len()),
        };
        for instruction in data.instructions {
            circuit.push(instruction)?;
        }
        Ok(circuit)
    }
}

impl Circuit {
    /// Narrowest width [`Circuit::demo`] accepts.
    pub const DEMO_MIN_QUBITS: u32 = 5;

    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
        }
    }

    /// Create a circuit with one quantum register `q` and one classical register `c`.
    ///
    /// A register of size zero is not declared.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for i in 0..num_qubits {
            circuit.qubits.push(Qubit::new(QubitId(i), "q", i));
        }
        for i in 0..num_clbits {
            circuit.clbits.push(Clbit::new(ClbitId(i), "c", i));
        }
        circuit
    }

    /// Declare a quantum register.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<QubitId>> {
        let name = name.into();
        self.check_register_name(&name)?;

        let (start, end) = bit_range(self.qubits.len(), size, &name)?;
        let ids: Vec<_> = (start..end).map(QubitId).collect();
        for (index, &id) in ids.iter().enumerate() {
            self.qubits.push(Qubit::new(id, &name, index as u32));
        }
        Ok(ids)
    }

    /// Declare a classical register.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<ClbitId>> {
        let name = name.into();
        self.check_register_name(&name)?;

        let (start, end) = bit_range(self.clbits.len(), size, &name)?;
        let ids: Vec<_> = (start..end).map(ClbitId).collect();
        for (index, &id) in ids.iter().enumerate() {
            self.clbits.push(Clbit::new(id, &name, index as u32));
        }
        Ok(ids)
    }

    fn check_register_name(&self, name: &str) -> IrResult<()> {
        if !self.instructions.is_empty() {
            return Err(IrError::RegisterFrozen(name.to_string()));
        }
        let taken = self.qubits.iter().any(|q| q.register == name)
            || self.clbits.iter().any(|c| c.register == name);
        if taken {
            return Err(IrError::DuplicateRegister(name.to_string()));
        }
        Ok(())
    }

    /// Append an instruction after validating its operands.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        let op_name = Some(instruction.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        if instruction.is_barrier() && instruction.qubits.is_empty() {
            return Err(IrError::EmptyBarrier);
        }

        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureArity {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if qubit.0 as usize >= self.qubits.len() {
                return Err(IrError::QubitNotFound { qubit, op_name });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit { qubit, op_name });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.0 as usize >= self.clbits.len() {
                return Err(IrError::ClbitNotFound { clbit, op_name });
            }
        }

        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply identity gate.
    pub fn id(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::I, qubit))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Sdg, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Tdg, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply RX rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Apply RY rotation.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))
    }

    /// Apply RZ rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::P(lambda), qubit))
    }

    /// Apply U(θ, φ, λ).
    pub fn u(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            StandardGate::U(theta, phi, lambda),
            qubit,
        ))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::CY, control, target))
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply controlled phase gate.
    pub fn cp(&mut self, lambda: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            StandardGate::CP(lambda),
            control,
            target,
        ))
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply any standard gate.
    pub fn gate(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::gate(gate, qubits))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(Instruction::measure(qubit, clbit))
    }

    /// Append a barrier over every qubit, then measure qubit `i` into classical bit `i`.
    ///
    /// Fails with [`IrError::MissingClassicalBits`] if the classical register is
    /// smaller than the quantum register.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        if self.clbits.len() < self.qubits.len() {
            return Err(IrError::MissingClassicalBits {
                needed: self.qubits.len(),
                available: self.clbits.len(),
            });
        }

        self.barrier_all()?;
        for i in 0..self.qubits.len() as u32 {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::reset(qubit))
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.push(Instruction::barrier(qubits))
    }

    /// Apply a barrier to all qubits. Does nothing on a circuit without qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        if self.qubits.is_empty() {
            return Ok(self);
        }
        let qubits: Vec<_> = self.qubits.iter().map(|q| q.id).collect();
        self.push(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Get the instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Quantum registers as `(name, size)` in declaration order.
    pub fn quantum_registers(&self) -> Vec<(&str, u32)> {
        group_registers(self.qubits.iter().map(|q| q.register.as_str()))
    }

    /// Classical registers as `(name, size)` in declaration order.
    pub fn classical_registers(&self) -> Vec<(&str, u32)> {
        group_registers(self.clbits.iter().map(|c| c.register.as_str()))
    }

    /// Number of gate instructions.
    pub fn gate_count(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_gate()).count()
    }

    /// Whether the circuit contains at least one measurement.
    pub fn is_measured(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// Every `(qubit, clbit)` measurement pair in program order.
    pub fn measurements(&self) -> Vec<(QubitId, ClbitId)> {
        self.instructions
            .iter()
            .flat_map(Instruction::measured_pairs)
            .collect()
    }

    /// Get the circuit depth.
    ///
    /// Each instruction sits one layer after the deepest wire it touches; measurements
    /// also occupy their classical wire.
    pub fn depth(&self) -> usize {
        let mut qubit_layer = vec![0usize; self.qubits.len()];
        let mut clbit_layer = vec![0usize; self.clbits.len()];
        let mut depth = 0;

        for inst in &self.instructions {
            let front = inst
                .qubits
                .iter()
                .map(|q| qubit_layer[q.0 as usize])
                .chain(inst.clbits.iter().map(|c| clbit_layer[c.0 as usize]))
                .max()
                .unwrap_or(0);
            let layer = front + 1;
            for q in &inst.qubits {
                qubit_layer[q.0 as usize] = layer;
            }
            for c in &inst.clbits {
                clbit_layer[c.0 as usize] = layer;
            }
            depth = depth.max(layer);
        }

        depth
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell pair preparation: H on q0, then CX(q0, q1). Not measured.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?;
        Ok(circuit)
    }

    /// Create an n-qubit GHZ state preparation. Not measured.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }

        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        Ok(circuit)
    }

    /// Put every qubit into uniform superposition. Not measured.
    pub fn superposition(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("superposition", n, n);
        for i in 0..n {
            circuit.h(QubitId(i))?;
        }
        Ok(circuit)
    }

    /// The fixed demonstration program acting on qubits 3 and 4.
    ///
    /// Five barrier-separated stages interleave Hadamard, phase, Pauli-X and a
    /// Hadamard-conjugated CNOT (a CZ) on the pair. Needs `n >= DEMO_MIN_QUBITS`;
    /// smaller sizes fail with [`IrError::QubitNotFound`].
    pub fn demo(name: impl Into<String>, n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size(name, n, n);
        let (a, b) = (QubitId(3), QubitId(4));

        circuit.h(a)?.h(b)?.s(a)?.s(b)?.barrier_all()?;
        circuit.h(b)?.cx(a, b)?.h(b)?.barrier_all()?;
        circuit
            .s(a)?
            .s(b)?
            .h(a)?
            .h(b)?
            .x(a)?
            .x(b)?
            .barrier_all()?;
        circuit.h(b)?.cx(a, b)?.h(b)?.barrier_all()?;
        circuit.x(a)?.x(b)?.h(a)?.h(b)?;

        Ok(circuit)
    }
}

/// Ids `start..end` for a register of `size` appended after `len` bits.
fn bit_range(len: usize, size: u32, name: &str) -> IrResult<(u32, u32)> {
    u32::try_from(len)
        .ok()
        .and_then(|start| Some((start, start.checked_add(size)?)))
        .ok_or_else(|| IrError::RegisterTooLarge {
            name: name.to_string(),
            size,
        })
}

fn group_registers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(&'a str, u32)> {
    let mut out: Vec<(&str, u32)> = Vec::new();
    for name in names {
        match out.last_mut() {
            Some((last, size)) if *last == name => *size += 1,
            _ => out.push((name, 1)),
        }
    }
    out
}
