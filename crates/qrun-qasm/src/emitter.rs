//! QASM emitters for serializing circuits.

use std::f64::consts::PI;

use qrun_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId};

use crate::error::{ParseError, ParseResult};

/// Emit a circuit as `OpenQASM` 2.0 source code.
///
/// Registers keep their names and sizes, every instruction becomes one
/// statement, and measurements are written as `measure q[i] -> c[j];`.
/// The output parses back into the same instruction sequence.
pub fn emit(circuit: &Circuit) -> ParseResult<String> {
    Emitter::new(circuit, Dialect::Qasm2).emit_circuit()
}

/// Emit a circuit as `OpenQASM` 3.0 source code using `stdgates.inc`.
///
/// Used for submission to services that only accept version 3 programs.
pub fn emit_qasm3(circuit: &Circuit) -> ParseResult<String> {
    Emitter::new(circuit, Dialect::Qasm3).emit_circuit()
}

/// Emit `OpenQASM` 3.0 on physical qubits.
///
/// Qubit `i` of the circuit is written as `$layout[i]` and no quantum
/// register is declared, the form hardware services expect for circuits
/// already mapped to a device.
pub fn emit_qasm3_physical(circuit: &Circuit, layout: &[u32]) -> ParseResult<String> {
    if layout.len() != circuit.num_qubits() {
        return Err(ParseError::LayoutMismatch {
            qubits: circuit.num_qubits(),
            layout: layout.len(),
        });
    }
    let mut emitter = Emitter::new(circuit, Dialect::Qasm3);
    emitter.layout = Some(layout);
    emitter.emit_circuit()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Qasm2,
    Qasm3,
}

struct Emitter<'a> {
    circuit: &'a Circuit,
    dialect: Dialect,
    layout: Option<&'a [u32]>,
    output: String,
}

impl<'a> Emitter<'a> {
    fn new(circuit: &'a Circuit, dialect: Dialect) -> Self {
        Self {
            circuit,
            dialect,
            layout: None,
            output: String::new(),
        }
    }

    fn emit_circuit(mut self) -> ParseResult<String> {
        match self.dialect {
            Dialect::Qasm2 => {
                self.writeln("OPENQASM 2.0;");
                self.writeln("include \"qelib1.inc\";");
            }
            Dialect::Qasm3 => {
                self.writeln("OPENQASM 3.0;");
                self.writeln("include \"stdgates.inc\";");
            }
        }

        let virtual_registers = if self.layout.is_some() {
            vec![]
        } else {
            self.circuit.quantum_registers()
        };
        for (name, size) in virtual_registers {
            let decl = match self.dialect {
                Dialect::Qasm2 => format!("qreg {name}[{size}];"),
                Dialect::Qasm3 => format!("qubit[{size}] {name};"),
            };
            self.writeln(&decl);
        }
        for (name, size) in self.circuit.classical_registers() {
            let decl = match self.dialect {
                Dialect::Qasm2 => format!("creg {name}[{size}];"),
                Dialect::Qasm3 => format!("bit[{size}] {name};"),
            };
            self.writeln(&decl);
        }

        for instruction in self.circuit.instructions() {
            self.emit_instruction(instruction)?;
        }

        Ok(self.output)
    }

    fn emit_instruction(&mut self, instruction: &Instruction) -> ParseResult<()> {
        let qubits = self.emit_qubits(&instruction.qubits);

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let name = match (self.dialect, gate.name()) {
                    // Version 3 has `U` as a builtin instead of qelib1's `u`.
                    (Dialect::Qasm3, "u") => "U",
                    (_, name) => name,
                };
                let params = gate
                    .params()
                    .into_iter()
                    .map(emit_param)
                    .collect::<ParseResult<Vec<_>>>()?;

                if params.is_empty() {
                    self.writeln(&format!("{name} {qubits};"));
                } else {
                    self.writeln(&format!("{name}({}) {qubits};", params.join(",")));
                }
            }

            InstructionKind::Measure => {
                for (q, c) in instruction.measured_pairs() {
                    let qubit = self.qubit_ref(q);
                    let clbit = self.clbit_ref(c);
                    let line = match self.dialect {
                        Dialect::Qasm2 => format!("measure {qubit} -> {clbit};"),
                        Dialect::Qasm3 => format!("{clbit} = measure {qubit};"),
                    };
                    self.writeln(&line);
                }
            }

            InstructionKind::Reset => {
                self.writeln(&format!("reset {qubits};"));
            }

            InstructionKind::Barrier => {
                self.writeln(&format!("barrier {qubits};"));
            }
        }

        Ok(())
    }

    fn qubit_ref(&self, id: QubitId) -> String {
        match self.layout {
            Some(layout) => format!("${}", layout[id.0 as usize]),
            None => self.circuit.qubits()[id.0 as usize].to_string(),
        }
    }

    fn clbit_ref(&self, id: ClbitId) -> String {
        self.circuit.clbits()[id.0 as usize].to_string()
    }

    fn emit_qubits(&self, qubits: &[QubitId]) -> String {
        qubits
            .iter()
            .map(|&q| self.qubit_ref(q))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

/// Format an angle, preferring an exact `pi` fraction.
///
/// Other values use Rust's shortest round-trip representation, so parsing
/// the text yields the identical `f64`.
fn emit_param(value: f64) -> ParseResult<String> {
    if !value.is_finite() {
        return Err(ParseError::UnrepresentableParameter(value));
    }

    const FRACTIONS: [(f64, &str); 6] = [
        (1.0, "pi"),
        (2.0, "pi/2"),
        (4.0, "pi/4"),
        (8.0, "pi/8"),
        (3.0, "pi/3"),
        (6.0, "pi/6"),
    ];
    for (div, text) in FRACTIONS {
        if value == PI / div {
            return Ok(text.to_string());
        }
        if value == -(PI / div) {
            return Ok(format!("-{text}"));
        }
    }

    // Debug keeps a decimal point or exponent ("1.0", "1e-7"), which the
    // lexer reads back as a float literal.
    Ok(format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::Circuit;

    #[test]
    fn test_emit_bell_qasm2() {
        let mut circuit = Circuit::bell().unwrap();
        circuit.measure_all().unwrap();
        let qasm = emit(&circuit).unwrap();

        let expected = "\
OPENQASM 2.0;
include \"qelib1.inc\";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
barrier q[0],q[1];
measure q[0] -> c[0];
measure q[1] -> c[1];
";
        assert_eq!(qasm, expected);
    }

    #[test]
    fn test_emit_qasm3() {
        let mut circuit = Circuit::with_size("t", 1, 1);
        circuit.u(PI, 0.0, PI / 2.0, QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        let qasm = emit_qasm3(&circuit).unwrap();

        assert!(qasm.starts_with("OPENQASM 3.0;"));
        assert!(qasm.contains("qubit[1] q;"));
        assert!(qasm.contains("bit[1] c;"));
        assert!(qasm.contains("U(pi,0.0,pi/2) q[0];"));
        assert!(qasm.contains("c[0] = measure q[0];"));
    }

    #[test]
    fn test_emit_qasm3_physical() {
        let mut circuit = Circuit::bell().unwrap();
        circuit.measure_all().unwrap();
        let qasm = emit_qasm3_physical(&circuit, &[7, 3]).unwrap();

        assert!(!qasm.contains("qubit["));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("h $7;"));
        assert!(qasm.contains("cx $7,$3;"));
        assert!(qasm.contains("barrier $7,$3;"));
        assert!(qasm.contains("c[1] = measure $3;"));

        assert!(matches!(
            emit_qasm3_physical(&circuit, &[0]),
            Err(ParseError::LayoutMismatch { qubits: 2, layout: 1 })
        ));
    }

    #[test]
    fn test_emit_param() {
        assert_eq!(emit_param(PI).unwrap(), "pi");
        assert_eq!(emit_param(-PI / 4.0).unwrap(), "-pi/4");
        assert_eq!(emit_param(0.5).unwrap(), "0.5");
        assert_eq!(emit_param(1e-7).unwrap(), "1e-7");
        assert_eq!(emit_param(2.0).unwrap(), "2.0");
        assert!(emit_param(f64::NAN).is_err());
    }

    #[test]
    fn test_measure_all_without_qubits_roundtrips() {
        let mut circuit = Circuit::with_size("none", 0, 0);
        circuit.measure_all().unwrap();
        let qasm = emit(&circuit).unwrap();

        assert!(!qasm.contains("barrier"));
        let parsed = crate::parse(&qasm).unwrap();
        assert_eq!(parsed.instructions(), circuit.instructions());
    }

    #[test]
    fn test_emit_named_registers() {
        let mut circuit = Circuit::new("regs");
        let anc = circuit.add_qreg("anc", 1).unwrap();
        let data = circuit.add_qreg("data", 2).unwrap();
        let out = circuit.add_creg("out", 1).unwrap();
        circuit.cx(anc[0], data[1]).unwrap();
        circuit.measure(data[1], out[0]).unwrap();

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("qreg anc[1];\nqreg data[2];\ncreg out[1];"));
        assert!(qasm.contains("cx anc[0],data[1];"));
        assert!(qasm.contains("measure data[1] -> out[0];"));
    }
}
