//! Test expressions: the boolean guards attached to conditional template
//! segments.
//!
//! # Architecture
//!
//! ```text
//! guard text ──► lexer ──► parser ──► Expr ──┬──► probe (synthesize values)
//!                                            └──► evaluate (render guards)
//! ```
//!
//! Property paths are split into [`Expr::Chain`] segments. A trailing
//! `.size` or `.size()` turns the preceding path into [`Expr::Size`].

mod eval;
pub mod lexer;
mod parser;

pub use parser::{parse, ParseError, ParseResult};

use std::fmt;

/// Name of the pseudo-method that measures a collection.
pub const SIZE: &str = "size";

/// A constant operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// N-ary logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

/// A parsed test expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare name such as `status`.
    Property(String),
    Const(Literal),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Flattened `&&` / `||` with two or more operands.
    Logical { op: LogicalOp, operands: Vec<Expr> },
    Not(Box<Expr>),
    /// Arithmetic negation.
    Negate(Box<Expr>),
    /// Dotted access; every segment is a property, constant or method call.
    Chain(Vec<Expr>),
    /// Collection size of the target.
    Size(Box<Expr>),
    /// Any other method call. Arguments are not retained.
    Method(String),
}

impl Expr {
    pub fn property(name: impl Into<String>) -> Self {
        Expr::Property(name.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Const(Literal::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Const(Literal::Str(value.into()))
    }

    pub fn null() -> Self {
        Expr::Const(Literal::Null)
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(operands: Vec<Expr>) -> Self {
        Expr::Logical {
            op: LogicalOp::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Expr::Logical {
            op: LogicalOp::Or,
            operands,
        }
    }

    /// `a.b.c` as a chain of property segments.
    pub fn chain(path: &str) -> Self {
        let mut segments: Vec<Expr> = path.split('.').map(Expr::property).collect();
        if segments.len() == 1 {
            segments.remove(0)
        } else {
            Expr::Chain(segments)
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Str(s) => write!(f, "'{s}'"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("&&"),
            LogicalOp::Or => f.write_str("||"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Property(name) => write!(f, "{name}"),
            Expr::Const(literal) => write!(f, "{literal}"),
            Expr::Compare { op, left, right } => write!(f, "{left} {op} {right}"),
            Expr::Logical { op, operands } => {
                write!(f, "(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {op} ")?;
                    }
                    write!(f, "{operand}")?;
                }
                write!(f, ")")
            }
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Negate(inner) => write!(f, "-{inner}"),
            Expr::Chain(segments) => {
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{segment}")?;
                }
                Ok(())
            }
            Expr::Size(target) => write!(f, "{target}.size()"),
            Expr::Method(name) => write!(f, "{name}()"),
        }
    }
}
