//! Parser for `OpenQASM` 2.0.

mod expression;
mod lowering;
mod statement;

pub(crate) use lowering::lower_to_circuit;

use qrun_ir::Circuit;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a QASM 2.0 source string into a Circuit.
///
/// The circuit is named `"circuit"`; use [`parse_named`] to choose a name.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    parse_named(source, "circuit")
}

/// Parse a QASM 2.0 source string into a Circuit with the given name.
pub fn parse_named(source: &str, name: &str) -> ParseResult<Circuit> {
    let program = parse_ast(source)?;
    lower_to_circuit(&program, name)
}

/// Parse a QASM 2.0 source string into a syntax tree.
pub fn parse_ast(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((line, message)) => return Err(ParseError::LexerError { line, message }),
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line of the current token, or of the last token at end of input.
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    pub(super) fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        self.expect(Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse the version number; only 2.x is accepted.
    fn parse_version(&mut self) -> ParseResult<String> {
        let version = match self.advance() {
            Some(Token::FloatLiteral(v)) => format!("{v:.1}"),
            Some(Token::IntLiteral(v)) => format!("{v}.0"),
            Some(other) => return Err(ParseError::InvalidVersion(other.to_string())),
            None => return Err(ParseError::UnexpectedEof("version number".into())),
        };
        if !version.starts_with("2.") {
            return Err(ParseError::InvalidVersion(version));
        }
        Ok(version)
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => {
                self.pos -= 1;
                Err(self.unexpected("identifier", &other))
            }
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    /// Parse an integer literal.
    pub(super) fn parse_int_literal(&mut self) -> ParseResult<u64> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v),
            Some(other) => {
                self.pos -= 1;
                Err(self.unexpected("integer", &other))
            }
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::{ClbitId, QubitId, StandardGate};

    #[test]
    fn test_parse_bell_state() {
        let source = r#"
            OPENQASM 2.0;
            include "qelib1.inc";
            qreg q[2];
            creg c[2];
            h q[0];
            cx q[0],q[1];
            measure q -> c;
        "#;

        let circuit = parse(source).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.gate_count(), 2);
        assert_eq!(
            circuit.measurements(),
            vec![(QubitId(0), ClbitId(0)), (QubitId(1), ClbitId(1))]
        );
    }

    #[test]
    fn test_parse_parameterized() {
        let source = r"
            OPENQASM 2.0;
            qreg q[1];
            rx(pi/2) q[0];
            u3(pi, -pi/4, 2*0.25) q[0];
            u1(0.5) q[0];
        ";

        let circuit = parse(source).unwrap();
        let gates: Vec<_> = circuit
            .instructions()
            .iter()
            .filter_map(|i| i.as_gate().copied())
            .collect();
        assert_eq!(
            gates,
            vec![
                StandardGate::Rx(std::f64::consts::FRAC_PI_2),
                StandardGate::U(std::f64::consts::PI, -std::f64::consts::FRAC_PI_4, 0.5),
                StandardGate::P(0.5),
            ]
        );
    }

    #[test]
    fn test_parse_multiple_registers_and_broadcast() {
        let source = r"
            OPENQASM 2.0;
            qreg a[2];
            qreg b[2];
            creg c[4];
            h a;
            cx a, b;
            barrier a, b;
        ";

        let circuit = parse(source).unwrap();
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.quantum_registers(), vec![("a", 2), ("b", 2)]);

        let insts = circuit.instructions();
        assert_eq!(insts.len(), 5);
        assert_eq!(insts[2].qubits, vec![QubitId(0), QubitId(2)]);
        assert_eq!(insts[3].qubits, vec![QubitId(1), QubitId(3)]);
        assert_eq!(insts[4].qubits.len(), 4);
    }

    #[test]
    fn test_parse_rejects_qasm3() {
        let err = parse("OPENQASM 3.0; qubit[2] q;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidVersion(_)));
    }

    #[test]
    fn test_parse_error_undefined() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nh undefined[0];";
        let err = parse(source).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UndefinedIdentifier { line: 3, ref name } if name == "undefined"
        ));
    }

    #[test]
    fn test_parse_error_unknown_gate() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nfoo q[0];";
        assert!(matches!(
            parse(source),
            Err(ParseError::UnknownGate { line: 3, .. })
        ));
    }

    #[test]
    fn test_parse_error_out_of_bounds() {
        let source = "OPENQASM 2.0;\nqreg q[2];\nx q[2];";
        assert!(matches!(
            parse(source),
            Err(ParseError::IndexOutOfBounds { index: 2, size: 2, .. })
        ));
    }

    #[test]
    fn test_parse_error_missing_semicolon() {
        let source = "OPENQASM 2.0;\nqreg q[2]\nx q[0];";
        assert!(matches!(
            parse(source),
            Err(ParseError::UnexpectedToken { line: 3, .. })
        ));
    }
}
