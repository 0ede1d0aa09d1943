//! Syntax tree for `OpenQASM` 2.0 programs.

use crate::error::{ParseError, ParseResult};

/// A parsed program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Version string from the header, e.g. `"2.0"`.
    pub version: String,
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

/// A top-level statement together with the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

/// The statements the reader understands.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `include "file";`
    Include(String),
    /// `qreg name[size];`
    QregDecl { name: String, size: u64 },
    /// `creg name[size];`
    CregDecl { name: String, size: u64 },
    /// `name(params) args;`
    GateCall {
        name: String,
        params: Vec<Expression>,
        args: Vec<Operand>,
    },
    /// `measure qubit -> bit;`
    Measure { qubit: Operand, target: Operand },
    /// `reset operand;`
    Reset(Operand),
    /// `barrier operands;`
    Barrier(Vec<Operand>),
}

/// A register reference, either a whole register or one element of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub name: String,
    pub index: Option<u64>,
}

/// Binary operators allowed in parameter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// A classical parameter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Int(u64),
    Float(f64),
    Pi,
    Neg(Box<Expression>),
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    FnCall {
        name: String,
        arg: Box<Expression>,
    },
}

impl Expression {
    /// Evaluate to a number. Identifiers are rejected by the parser, so
    /// every expression here is a constant.
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(&self, line: usize) -> ParseResult<f64> {
        Ok(match self {
            Expression::Int(v) => *v as f64,
            Expression::Float(v) => *v,
            Expression::Pi => std::f64::consts::PI,
            Expression::Neg(e) => -e.evaluate(line)?,
            Expression::BinOp { left, op, right } => {
                let (l, r) = (left.evaluate(line)?, right.evaluate(line)?);
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                }
            }
            Expression::FnCall { name, arg } => {
                let x = arg.evaluate(line)?;
                match name.as_str() {
                    "sin" => x.sin(),
                    "cos" => x.cos(),
                    "tan" => x.tan(),
                    "exp" => x.exp(),
                    "ln" => x.ln(),
                    "sqrt" => x.sqrt(),
                    other => {
                        return Err(ParseError::Unsupported {
                            line,
                            construct: format!("function '{other}'"),
                        });
                    }
                }
            }
        })
    }
}
