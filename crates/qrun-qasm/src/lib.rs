//! `OpenQASM` 2.0 reader and writer for qrun.
//!
//! Circuits are written in the dialect Qiskit produces (`qelib1.inc`, `qreg`/`creg`,
//! `measure a -> b`) and read back into the same instruction sequence.
//!
//! # Supported Features
//!
//! | Feature | Status | Example |
//! |---------|--------|---------|
//! | Version declaration | ✅ | `OPENQASM 2.0;` |
//! | Includes | ✅ (ignored) | `include "qelib1.inc";` |
//! | Registers | ✅ | `qreg q[5];`, `creg c[5];` |
//! | Standard gates | ✅ | `h q[0];`, `cx q[0],q[1];` |
//! | Parameterized gates | ✅ | `rz(pi/4) q[0];`, `u3(pi,0,pi) q[1];` |
//! | Register broadcast | ✅ | `h q;`, `measure q -> c;` |
//! | Barriers and reset | ✅ | `barrier q;`, `reset q[0];` |
//! | Gate definitions, `if` | ❌ | |
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use qrun_ir::Circuit;
//! use qrun_qasm::{emit, parse};
//!
//! let mut circuit = Circuit::bell().unwrap();
//! circuit.measure_all().unwrap();
//!
//! let qasm = emit(&circuit).unwrap();
//! assert!(qasm.contains("measure q[1] -> c[1];"));
//!
//! let parsed = parse(&qasm).unwrap();
//! assert_eq!(parsed.instructions(), circuit.instructions());
//! ```

mod ast;
mod emitter;
mod error;
mod file;
mod lexer;
mod parser;

pub use emitter::{emit, emit_qasm3, emit_qasm3_physical};
pub use error::{ParseError, ParseResult};
pub use file::{read_qasm_file, write_qasm_file};
pub use parser::{parse, parse_named};

/// Syntax tree types, for callers that need more than a lowered circuit.
pub mod syntax {
    pub use crate::ast::*;
    pub use crate::parser::parse_ast;
}
