//! Pending operator records held on the probe engine's operator stack.

use std::fmt;

use crate::expr::{CompareOp, LogicalOp};

/// How tightly an operator binds, tightest first.
///
/// A lazily reduced operator on top of the stack is reduced before a new
/// operator is pushed when its binding power is not looser than the
/// newcomer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BindingPower {
    Structural,
    Comparison,
    Unary,
    And,
    Or,
    Opaque,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    Compare(CompareOp),
    Not,
    /// Asserts a bare property is true.
    Eval,
    Logical(LogicalOp),
    Negate,
    /// Joins dotted segments into one path.
    Chain,
    /// Binds the nearest path to an empty sequence.
    Size,
    /// A method the engine knows nothing about.
    Opaque(String),
}

impl OperatorKind {
    pub fn binding_power(&self) -> BindingPower {
        match self {
            OperatorKind::Chain | OperatorKind::Negate | OperatorKind::Size => {
                BindingPower::Structural
            }
            OperatorKind::Compare(_) => BindingPower::Comparison,
            OperatorKind::Not | OperatorKind::Eval => BindingPower::Unary,
            OperatorKind::Logical(LogicalOp::And) => BindingPower::And,
            OperatorKind::Logical(LogicalOp::Or) => BindingPower::Or,
            OperatorKind::Opaque(_) => BindingPower::Opaque,
        }
    }

    /// Reduced when the node that opened it is left, never by a later push.
    pub fn reduces_on_close(&self) -> bool {
        matches!(
            self,
            OperatorKind::Chain | OperatorKind::Negate | OperatorKind::Size | OperatorKind::Eval
        )
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorKind::Compare(op) => write!(f, "{op}"),
            OperatorKind::Not => write!(f, "!"),
            OperatorKind::Eval => write!(f, "eval"),
            OperatorKind::Logical(op) => write!(f, "{op}"),
            OperatorKind::Negate => write!(f, "neg"),
            OperatorKind::Chain => write!(f, "chain"),
            OperatorKind::Size => write!(f, "size"),
            OperatorKind::Opaque(name) => write!(f, "{name}()"),
        }
    }
}

/// An operator awaiting its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperator {
    pub kind: OperatorKind,
    /// Operands consumed on reduction. Grows per segment for chains.
    pub arity: usize,
    /// Operand stack height when the operator was pushed.
    pub offset: usize,
}

impl PendingOperator {
    /// Whether every operand has been pushed given the current stack height.
    pub fn is_complete(&self, operand_height: usize) -> bool {
        operand_height >= self.offset + self.arity
    }
}
