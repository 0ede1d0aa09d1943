//! Syntax tree to Circuit lowering for QASM 2.0.

use qrun_ir::{Circuit, ClbitId, QubitId, StandardGate};
use rustc_hash::FxHashMap;

use crate::ast::{Operand, Program, StatementKind};
use crate::error::{ParseError, ParseResult};

/// Lower a parsed Program to a Circuit.
pub(crate) fn lower_to_circuit(program: &Program, name: &str) -> ParseResult<Circuit> {
    let mut lowerer = Lowerer::default();
    lowerer.lower(program, name)
}

/// Register lookup tables built from the declarations.
#[derive(Default)]
struct Lowerer {
    /// Quantum registers: name -> (first id, size).
    qregs: FxHashMap<String, (u32, u32)>,
    /// Classical registers: name -> (first id, size).
    cregs: FxHashMap<String, (u32, u32)>,
}

impl Lowerer {
    fn lower(&mut self, program: &Program, name: &str) -> ParseResult<Circuit> {
        let mut circuit = Circuit::new(name);

        // Registers first: the circuit freezes them once instructions arrive.
        for stmt in &program.statements {
            match &stmt.kind {
                StatementKind::QregDecl { name, size } => {
                    let size = register_size(*size, circuit.num_qubits(), stmt.line)?;
                    let ids = circuit.add_qreg(name.clone(), size)?;
                    let start = ids.first().map_or(circuit.num_qubits() as u32, |q| q.0);
                    self.qregs.insert(name.clone(), (start, size));
                }
                StatementKind::CregDecl { name, size } => {
                    let size = register_size(*size, circuit.num_clbits(), stmt.line)?;
                    let ids = circuit.add_creg(name.clone(), size)?;
                    let start = ids.first().map_or(circuit.num_clbits() as u32, |c| c.0);
                    self.cregs.insert(name.clone(), (start, size));
                }
                _ => {}
            }
        }

        for stmt in &program.statements {
            self.lower_statement(&mut circuit, &stmt.kind, stmt.line)?;
        }

        Ok(circuit)
    }

    fn lower_statement(
        &self,
        circuit: &mut Circuit,
        kind: &StatementKind,
        line: usize,
    ) -> ParseResult<()> {
        match kind {
            StatementKind::Include(_)
            | StatementKind::QregDecl { .. }
            | StatementKind::CregDecl { .. } => {}

            StatementKind::GateCall { name, params, args } => {
                let expected_params = StandardGate::arity_of(name).ok_or_else(|| {
                    ParseError::UnknownGate {
                        line,
                        name: name.clone(),
                    }
                })?;
                if params.len() != expected_params {
                    return Err(ParseError::WrongParameterCount {
                        line,
                        gate: name.clone(),
                        expected: expected_params,
                        got: params.len(),
                    });
                }

                let values = params
                    .iter()
                    .map(|p| p.evaluate(line))
                    .collect::<ParseResult<Vec<_>>>()?;
                let gate = StandardGate::from_name(name, &values).ok_or_else(|| {
                    ParseError::UnknownGate {
                        line,
                        name: name.clone(),
                    }
                })?;

                let expected_qubits = gate.num_qubits() as usize;
                if args.len() != expected_qubits {
                    return Err(ParseError::WrongQubitCount {
                        line,
                        gate: name.clone(),
                        expected: expected_qubits,
                        got: args.len(),
                    });
                }

                let resolved = args
                    .iter()
                    .map(|a| self.resolve_qubits(a, line))
                    .collect::<ParseResult<Vec<_>>>()?;
                for qubits in broadcast(&resolved, line)? {
                    circuit.gate(gate, qubits)?;
                }
            }

            StatementKind::Measure { qubit, target } => {
                let q_ids = self.resolve_qubits(qubit, line)?;
                let c_ids = self.resolve_clbits(target, line)?;
                if q_ids.len() != c_ids.len() {
                    return Err(ParseError::RegisterSizeMismatch {
                        line,
                        message: format!(
                            "measuring {} qubits into {} bits",
                            q_ids.len(),
                            c_ids.len()
                        ),
                    });
                }
                for (q, c) in q_ids.into_iter().zip(c_ids) {
                    circuit.measure(q, c)?;
                }
            }

            StatementKind::Reset(operand) => {
                for q in self.resolve_qubits(operand, line)? {
                    circuit.reset(q)?;
                }
            }

            StatementKind::Barrier(operands) => {
                let mut qubits: Vec<QubitId> = Vec::new();
                for operand in operands {
                    for q in self.resolve_qubits(operand, line)? {
                        if !qubits.contains(&q) {
                            qubits.push(q);
                        }
                    }
                }
                circuit.barrier(qubits)?;
            }
        }
        Ok(())
    }

    fn resolve_qubits(&self, operand: &Operand, line: usize) -> ParseResult<Vec<QubitId>> {
        let ids = resolve(&self.qregs, operand, line)?;
        Ok(ids.into_iter().map(QubitId).collect())
    }

    fn resolve_clbits(&self, operand: &Operand, line: usize) -> ParseResult<Vec<ClbitId>> {
        let ids = resolve(&self.cregs, operand, line)?;
        Ok(ids.into_iter().map(ClbitId).collect())
    }
}

/// Most quantum or classical bits a program may declare in total.
const MAX_DECLARED_BITS: u64 = 1 << 16;

/// Size of a new register, given `declared` bits of the same kind before it.
fn register_size(size: u64, declared: usize, line: usize) -> ParseResult<u32> {
    let total = (declared as u64).saturating_add(size);
    if total > MAX_DECLARED_BITS {
        return Err(ParseError::Unsupported {
            line,
            construct: format!(
                "register of size {size} (at most {MAX_DECLARED_BITS} bits in total)"
            ),
        });
    }
    u32::try_from(size).map_err(|_| ParseError::Unsupported {
        line,
        construct: format!("register of size {size}"),
    })
}

/// Resolve an operand to the ids it names: one for `r[i]`, all of `r` otherwise.
fn resolve(
    registers: &FxHashMap<String, (u32, u32)>,
    operand: &Operand,
    line: usize,
) -> ParseResult<Vec<u32>> {
    let &(start, size) =
        registers
            .get(&operand.name)
            .ok_or_else(|| ParseError::UndefinedIdentifier {
                line,
                name: operand.name.clone(),
            })?;

    match operand.index {
        Some(index) if index >= u64::from(size) => Err(ParseError::IndexOutOfBounds {
            register: operand.name.clone(),
            index,
            size,
        }),
        Some(index) => Ok(vec![start + index as u32]),
        None => Ok((start..start + size).collect()),
    }
}

/// Expand whole-register arguments element-wise.
///
/// Single-element arguments are repeated; every multi-element argument must
/// have the same length.
fn broadcast(args: &[Vec<QubitId>], line: usize) -> ParseResult<Vec<Vec<QubitId>>> {
    let width = args.iter().map(Vec::len).filter(|&n| n != 1).max().unwrap_or(1);

    if let Some(bad) = args.iter().find(|a| a.len() != 1 && a.len() != width) {
        return Err(ParseError::RegisterSizeMismatch {
            line,
            message: format!("registers of size {} and {width}", bad.len()),
        });
    }

    Ok((0..width)
        .map(|i| {
            args.iter()
                .map(|a| if a.len() == 1 { a[0] } else { a[i] })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::parser::parse;
    use qrun_ir::QubitId;

    #[test]
    fn test_broadcast_single_against_register() {
        let source = "OPENQASM 2.0;\nqreg a[1];\nqreg b[3];\ncx a[0], b;";
        let circuit = parse(source).unwrap();
        let targets: Vec<_> = circuit.instructions().iter().map(|i| i.qubits[1]).collect();
        assert_eq!(targets, vec![QubitId(1), QubitId(2), QubitId(3)]);
        assert!(
            circuit
                .instructions()
                .iter()
                .all(|i| i.qubits[0] == QubitId(0))
        );
    }

    #[test]
    fn test_broadcast_size_mismatch() {
        let source = "OPENQASM 2.0;\nqreg a[2];\nqreg b[3];\ncx a, b;";
        assert!(matches!(
            parse(source),
            Err(ParseError::RegisterSizeMismatch { line: 4, .. })
        ));
    }

    #[test]
    fn test_wrong_counts() {
        let too_few = "OPENQASM 2.0;\nqreg q[2];\ncx q[0];";
        assert!(matches!(
            parse(too_few),
            Err(ParseError::WrongQubitCount { expected: 2, got: 1, .. })
        ));

        let bad_params = "OPENQASM 2.0;\nqreg q[1];\nrx q[0];";
        assert!(matches!(
            parse(bad_params),
            Err(ParseError::WrongParameterCount { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_reset_and_measure_whole_register() {
        let source = "OPENQASM 2.0;\nqreg q[3];\ncreg c[3];\nreset q;\nmeasure q -> c;";
        let circuit = parse(source).unwrap();
        assert_eq!(
            circuit.instructions().iter().filter(|i| i.is_reset()).count(),
            3
        );
        assert_eq!(circuit.measurements().len(), 3);
    }

    #[test]
    fn test_measure_size_mismatch() {
        let source = "OPENQASM 2.0;\nqreg q[3];\ncreg c[2];\nmeasure q -> c;";
        assert!(matches!(
            parse(source),
            Err(ParseError::RegisterSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_oversized_registers_rejected() {
        let huge = "OPENQASM 2.0;\nqreg q[4000000000];";
        assert!(matches!(
            parse(huge),
            Err(ParseError::Unsupported { line: 2, .. })
        ));

        let split = "OPENQASM 2.0;\nqreg a[40000];\nqreg b[40000];";
        assert!(matches!(
            parse(split),
            Err(ParseError::Unsupported { line: 3, .. })
        ));

        let fits = "OPENQASM 2.0;\nqreg a[30000];\ncreg b[30000];";
        assert!(parse(fits).is_ok());
    }

    #[test]
    fn test_duplicate_register() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nqreg q[2];";
        assert!(matches!(parse(source), Err(ParseError::CircuitError(_))));
    }
}
