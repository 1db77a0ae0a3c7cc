//! Evaluation of test expressions against a binding context.
//!
//! Used when rendering a template: a guard is true when its value is truthy.
//! Comparisons between mismatched types are false rather than errors.

use std::cmp::Ordering;

use super::{CompareOp, Expr, Literal, LogicalOp};
use crate::value::{Bindings, Value};

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(x) => Value::Float(*x),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl Expr {
    /// Evaluate against `scope`. Unknown names evaluate to [`Value::Unbound`].
    pub fn evaluate(&self, scope: &Bindings) -> Value {
        match self {
            Expr::Property(name) => scope.get(name).cloned().unwrap_or(Value::Unbound),
            Expr::Const(literal) => literal.to_value(),
            Expr::Chain(segments) => evaluate_chain(segments, scope),
            Expr::Size(target) => match target.evaluate(scope) {
                Value::Seq(items) => Value::Int(items.len() as i64),
                Value::Map(entries) => Value::Int(entries.len() as i64),
                Value::Str(s) => Value::Int(s.chars().count() as i64),
                _ => Value::Unbound,
            },
            Expr::Method(_) => Value::Unbound,
            Expr::Compare { op, left, right } => {
                Value::Bool(compare(*op, &left.evaluate(scope), &right.evaluate(scope)))
            }
            Expr::Logical { op, operands } => {
                let mut values = operands.iter().map(|operand| operand.evaluate(scope).truthy());
                Value::Bool(match op {
                    LogicalOp::And => values.all(|v| v),
                    LogicalOp::Or => values.any(|v| v),
                })
            }
            Expr::Not(inner) => Value::Bool(!inner.evaluate(scope).truthy()),
            Expr::Negate(inner) => match inner.evaluate(scope) {
                Value::Int(n) => Value::Int(n.wrapping_neg()),
                Value::Float(x) => Value::Float(-x),
                _ => Value::Unbound,
            },
        }
    }

    /// Evaluate as a guard.
    pub fn holds(&self, scope: &Bindings) -> bool {
        self.evaluate(scope).truthy()
    }
}

fn evaluate_chain(segments: &[Expr], scope: &Bindings) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return Value::Unbound;
    };
    let mut current = head.evaluate(scope);
    for segment in rest {
        current = match segment {
            Expr::Property(name) => current.member(name).cloned().unwrap_or(Value::Unbound),
            _ => Value::Unbound,
        };
    }
    current
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => equal(left, right),
        CompareOp::NotEq => !equal(left, right),
        CompareOp::Lt => order(left, right) == Some(Ordering::Less),
        CompareOp::LtEq => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => order(left, right) == Some(Ordering::Greater),
        CompareOp::GtEq => matches!(
            order(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

fn equal(left: &Value, right: &Value) -> bool {
    if left.is_nullish() || right.is_nullish() {
        return left.is_nullish() && right.is_nullish();
    }
    if let (Some(l), Some(r)) = (numeric(left), numeric(right)) {
        return l == r;
    }
    match (left, right) {
        (Value::NonNullUnknown, Value::NonNullUnknown) => true,
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (numeric(left), numeric(right)) {
        return l.partial_cmp(&r);
    }
    match (left, right) {
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Numbers, and strings that read as numbers when compared with one.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
}
