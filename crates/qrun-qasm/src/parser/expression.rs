//! Expression parsing for QASM 2.0 gate parameters.

use super::Parser;
use crate::ast::{BinOp, Expression};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            // `^` is right-associative.
            let next_prec = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_prec)?;
            left = Expression::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expression::Neg(Box::new(expr)));
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary_expr();
        }
        self.parse_primary_expr()
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => {
                self.advance();
                Ok(Expression::Int(v))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                Ok(Expression::Float(v))
            }
            Token::Pi => {
                self.advance();
                Ok(Expression::Pi)
            }
            Token::Identifier(name) => {
                self.advance();
                // Only unary built-in functions are valid here; gate parameters
                // outside a gate body cannot be symbolic.
                if !self.check(&Token::LParen) {
                    return Err(ParseError::Unsupported {
                        line: self.line(),
                        construct: format!("symbolic parameter '{name}'"),
                    });
                }
                self.advance();
                let arg = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::FnCall {
                    name,
                    arg: Box::new(arg),
                })
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression", &token)),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Caret => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse a comma-separated expression list (possibly empty).
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::StatementKind;
    use crate::parser::parse_ast;
    use std::f64::consts::PI;

    fn eval(expr: &str) -> f64 {
        let source = format!("OPENQASM 2.0;\nrz({expr}) q[0];");
        let program = parse_ast(&source).unwrap();
        match &program.statements[0].kind {
            StatementKind::GateCall { params, .. } => params[0].evaluate(2).unwrap(),
            other => panic!("Expected gate call, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        assert!((eval("1 + 2 * 3") - 7.0).abs() < 1e-12);
        assert!((eval("(1 + 2) * 3") - 9.0).abs() < 1e-12);
        assert!((eval("2 ^ 3 ^ 2") - 512.0).abs() < 1e-9);
        assert!((eval("-pi/2") + PI / 2.0).abs() < 1e-12);
        assert!((eval("8 - 2 - 1") - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_functions() {
        assert!((eval("cos(0)") - 1.0).abs() < 1e-12);
        assert!((eval("sqrt(4) + sin(pi/2)") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_symbolic_parameter_rejected() {
        let source = "OPENQASM 2.0;\nrz(theta) q[0];";
        assert!(parse_ast(source).is_err());
    }
}
