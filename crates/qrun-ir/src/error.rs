//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur while building a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_op_context(.op_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional operation name for context.
        op_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit} not found in circuit{}", format_op_context(.op_name))]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
        /// Optional operation name for context.
        op_name: Option<String>,
    },

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_op_context(.op_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional operation name for context.
        op_name: Option<String>,
    },

    /// Measurement operands do not pair up.
    #[error("Measurement of {qubits} qubits into {clbits} classical bits")]
    MeasureArity {
        /// Number of qubits given.
        qubits: usize,
        /// Number of classical bits given.
        clbits: usize,
    },

    /// Not enough classical bits to hold a full measurement.
    #[error("Circuit has {available} classical bits but {needed} are needed to measure every qubit")]
    MissingClassicalBits {
        /// Classical bits required.
        needed: usize,
        /// Classical bits present.
        available: usize,
    },

    /// Registers can no longer change once instructions were added.
    #[error("Cannot add register '{0}': circuit already contains instructions")]
    RegisterFrozen(String),

    /// A register with this name already exists.
    #[error("Register '{0}' is already declared")]
    DuplicateRegister(String),

    /// The register would take the bit count past `u32::MAX`.
    #[error("Register '{name}' of size {size} does not fit in the circuit")]
    RegisterTooLarge {
        /// Name of the register.
        name: String,
        /// Requested size.
        size: u32,
    },

    /// A barrier needs at least one qubit.
    #[error("Barrier over no qubits")]
    EmptyBarrier,

    /// Bits must be listed in id order.
    #[error("Bit '{bit}' listed at position {position}")]
    BitOutOfOrder {
        /// The misplaced bit.
        bit: String,
        /// Where it was found.
        position: usize,
    },
}

#[allow(clippy::ref_option)]
fn format_op_context(op_name: &Option<String>) -> String {
    match op_name {
        Some(name) => format!(" (op: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
