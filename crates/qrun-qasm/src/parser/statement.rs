//! Statement parsing for QASM 2.0.

use super::Parser;
use crate::ast::{Operand, Statement, StatementKind};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        let kind = match token {
            Token::Include => self.parse_include()?,
            Token::Qreg => {
                self.advance();
                let (name, size) = self.parse_register_decl()?;
                StatementKind::QregDecl { name, size }
            }
            Token::Creg => {
                self.advance();
                let (name, size) = self.parse_register_decl()?;
                StatementKind::CregDecl { name, size }
            }
            Token::Measure => self.parse_measure()?,
            Token::Reset => {
                self.advance();
                let operand = self.parse_operand()?;
                self.expect(Token::Semicolon)?;
                StatementKind::Reset(operand)
            }
            Token::Barrier => {
                self.advance();
                let operands = self.parse_operand_list()?;
                self.expect(Token::Semicolon)?;
                StatementKind::Barrier(operands)
            }
            Token::Identifier(_) => self.parse_gate_call()?,
            Token::Gate | Token::Opaque | Token::If => {
                return Err(ParseError::Unsupported {
                    line,
                    construct: format!("'{token}' statement"),
                });
            }
            other => return Err(self.unexpected("statement", &other)),
        };

        Ok(Statement { kind, line })
    }

    fn parse_include(&mut self) -> ParseResult<StatementKind> {
        self.expect(Token::Include)?;
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => {
                self.pos -= 1;
                return Err(self.unexpected("string", &other));
            }
            None => return Err(ParseError::UnexpectedEof("include path".into())),
        };
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::Include(path))
    }

    /// Parse `name[size];` after `qreg` or `creg`.
    fn parse_register_decl(&mut self) -> ParseResult<(String, u64)> {
        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let size = self.parse_int_literal()?;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;
        Ok((name, size))
    }

    fn parse_measure(&mut self) -> ParseResult<StatementKind> {
        self.expect(Token::Measure)?;
        let qubit = self.parse_operand()?;
        self.expect(Token::Arrow)?;
        let target = self.parse_operand()?;
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::Measure { qubit, target })
    }

    fn parse_gate_call(&mut self) -> ParseResult<StatementKind> {
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let params = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            params
        } else {
            vec![]
        };

        let args = self.parse_operand_list()?;
        self.expect(Token::Semicolon)?;

        Ok(StatementKind::GateCall { name, params, args })
    }

    /// Parse `name` or `name[index]`.
    fn parse_operand(&mut self) -> ParseResult<Operand> {
        let name = self.parse_identifier()?;
        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_int_literal()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(Operand { name, index })
    }

    fn parse_operand_list(&mut self) -> ParseResult<Vec<Operand>> {
        let mut operands = vec![self.parse_operand()?];
        while self.consume(&Token::Comma) {
            operands.push(self.parse_operand()?);
        }
        Ok(operands)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expression, StatementKind};
    use crate::error::ParseError;
    use crate::parser::parse_ast;

    #[test]
    fn test_statement_kinds_and_lines() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\n\
                      reset q[0];\nbarrier q;\nrz(pi) q[1];\nmeasure q[1] -> c[0];";
        let program = parse_ast(source).unwrap();

        assert_eq!(program.version, "2.0");
        let lines: Vec<_> = program.statements.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 6, 7, 8]);

        match &program.statements[5].kind {
            StatementKind::GateCall { name, params, args } => {
                assert_eq!(name, "rz");
                assert_eq!(params, &vec![Expression::Pi]);
                assert_eq!(args[0].index, Some(1));
            }
            other => panic!("Expected gate call, got {other:?}"),
        }
        match &program.statements[4].kind {
            StatementKind::Barrier(ops) => assert_eq!(ops[0].index, None),
            other => panic!("Expected barrier, got {other:?}"),
        }
    }

    #[test]
    fn test_gate_definitions_unsupported() {
        let source = "OPENQASM 2.0;\ngate foo a { x a; }";
        assert!(matches!(
            parse_ast(source),
            Err(ParseError::Unsupported { line: 2, .. })
        ));
    }

    #[test]
    fn test_measure_requires_arrow() {
        let source = "OPENQASM 2.0;\nqreg q[1];\ncreg c[1];\nmeasure q[0] c[0];";
        assert!(matches!(
            parse_ast(source),
            Err(ParseError::UnexpectedToken { line: 4, .. })
        ));
    }
}
