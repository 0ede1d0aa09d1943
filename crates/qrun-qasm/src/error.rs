//! Error types for reading and writing QASM.

use thiserror::Error;

/// Errors that can occur while parsing or emitting QASM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at line {line}: {message}")]
    LexerError { line: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Invalid version.
    #[error("Invalid OPENQASM version: {0} (only 2.0 is supported)")]
    InvalidVersion(String),

    /// Undefined register.
    #[error("Undefined register at line {line}: {name}")]
    UndefinedIdentifier { line: usize, name: String },

    /// Unknown gate.
    #[error("Unknown gate at line {line}: {name}")]
    UnknownGate { line: usize, name: String },

    /// Wrong number of qubit arguments.
    #[error("Gate '{gate}' at line {line} expects {expected} qubits, got {got}")]
    WrongQubitCount {
        line: usize,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Wrong number of parameters.
    #[error("Gate '{gate}' at line {line} expects {expected} parameters, got {got}")]
    WrongParameterCount {
        line: usize,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Index out of bounds.
    #[error("Index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        register: String,
        index: u64,
        size: u32,
    },

    /// Whole-register operands of different sizes.
    #[error("Register size mismatch at line {line}: {message}")]
    RegisterSizeMismatch { line: usize, message: String },

    /// Valid QASM that this reader does not handle.
    #[error("Unsupported construct at line {line}: {construct}")]
    Unsupported { line: usize, construct: String },

    /// Physical layout does not cover every qubit.
    #[error("Layout maps {layout} qubits but the circuit has {qubits}")]
    LayoutMismatch { qubits: usize, layout: usize },

    /// A gate parameter that cannot be written as a literal.
    #[error("Cannot emit parameter {0}")]
    UnrepresentableParameter(f64),

    /// Reading or writing a QASM file failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// IR error during circuit construction.
    #[error("Circuit error: {0}")]
    CircuitError(#[from] qrun_ir::IrError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
