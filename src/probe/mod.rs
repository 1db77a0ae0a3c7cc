//! Value synthesis for test expressions.
//!
//! Given a guard such as `status != null and status != ''`, the prober
//! writes values into a [`Bindings`] context under which the guard holds.
//!
//! # Machine
//!
//! The expression tree is walked depth first while two stacks are kept:
//! operands (property paths or concrete values) and pending operators.
//!
//! ```text
//! node opened ──► push operator ──► visit children ──► node closed
//!                     │                                    │
//!      maybe reduce one lazy top                 reduce structural scope
//! ```
//!
//! - Chain, negation, size and the truth assertion on a bare property are
//!   reduced as soon as their node is left.
//! - Comparisons, `!`, `&&`, `||` and unknown methods are reduced lazily: a
//!   push reduces the top record if it is complete and binds at least as
//!   tightly as the newcomer. Whatever remains is reduced once the walk ends.
//!
//! Reducing a comparison is where values get synthesized. The property side
//! is bound to a value that satisfies the operator against the other side.

mod operator;

pub use operator::{BindingPower, OperatorKind, PendingOperator};

use tracing::{debug, trace, warn};

use crate::config::ProbeSettings;
use crate::expr::{parse, CompareOp, Expr, LogicalOp, ParseResult, SIZE};
use crate::value::{Bindings, Value};

/// An entry on the operand stack.
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    /// A bindable property name, possibly dotted.
    Path(String),
    Value(Value),
}

/// Where a node sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Root,
    Logical,
    Chain,
    Other,
}

impl Parent {
    /// A bare property here must be true for the guard to hold.
    fn is_boolean_position(self) -> bool {
        matches!(self, Parent::Root | Parent::Logical)
    }
}

/// Synthesizes bindings that make test expressions true.
#[derive(Debug, Clone)]
pub struct Prober<'a> {
    settings: &'a ProbeSettings,
}

impl<'a> Prober<'a> {
    pub fn new(settings: &'a ProbeSettings) -> Self {
        Self { settings }
    }

    /// Extend `bindings` so that `expr` evaluates to true where possible.
    ///
    /// Never fails. Constructs the engine cannot satisfy are logged and
    /// leave the context untouched.
    pub fn probe(&self, expr: &Expr, bindings: &mut Bindings) {
        debug!(%expr, "probing");
        let mut machine = Machine {
            operands: Vec::new(),
            operators: Vec::new(),
            bindings,
            settings: self.settings,
        };
        machine.visit(expr, Parent::Root);
        machine.finish();
    }

    /// Parse `source` and probe it.
    pub fn probe_source(&self, source: &str, bindings: &mut Bindings) -> ParseResult<()> {
        let expr = parse(source)?;
        self.probe(&expr, bindings);
        Ok(())
    }
}

struct Machine<'b> {
    operands: Vec<Operand>,
    operators: Vec<PendingOperator>,
    bindings: &'b mut Bindings,
    settings: &'b ProbeSettings,
}

impl<'b> Machine<'b> {
    fn visit(&mut self, expr: &Expr, parent: Parent) {
        match expr {
            Expr::Property(name) => {
                let eval = parent.is_boolean_position().then(|| self.open(OperatorKind::Eval, 1));
                self.operands.push(Operand::Path(name.clone()));
                if let Some(depth) = eval {
                    self.close(depth);
                }
            }
            Expr::Chain(segments) => {
                let eval = parent.is_boolean_position().then(|| self.open(OperatorKind::Eval, 1));
                self.visit_chain(segments);
                if let Some(depth) = eval {
                    self.close(depth);
                }
            }
            Expr::Const(literal) => self.operands.push(Operand::Value(literal.to_value())),
            Expr::Method(name) if name == SIZE => {
                let depth = self.open(OperatorKind::Size, 0);
                self.close(depth);
            }
            Expr::Method(name) => self.push_operator(OperatorKind::Opaque(name.clone()), 0),
            Expr::Compare { op, left, right } => {
                self.push_operator(OperatorKind::Compare(*op), 2);
                self.visit(left, Parent::Other);
                self.visit(right, Parent::Other);
            }
            Expr::Logical { op, operands } => {
                self.push_operator(OperatorKind::Logical(*op), operands.len());
                for operand in operands {
                    self.visit(operand, Parent::Logical);
                }
            }
            Expr::Not(inner) => {
                self.push_operator(OperatorKind::Not, 1);
                self.visit(inner, Parent::Other);
            }
            Expr::Negate(inner) => {
                let depth = self.open(OperatorKind::Negate, 1);
                self.visit(inner, Parent::Other);
                self.close(depth);
            }
            Expr::Size(target) => {
                let depth = self.open(OperatorKind::Size, 0);
                self.visit(target, Parent::Other);
                self.close(depth);
            }
        }
    }

    fn visit_chain(&mut self, segments: &[Expr]) {
        let depth = self.open(OperatorKind::Chain, 0);
        for (i, segment) in segments.iter().enumerate() {
            if is_size_segment(segment) {
                // `.size` spelled mid-chain: measure what precedes it
                self.close(depth);
                let size = self.open(OperatorKind::Size, 0);
                self.close(size);
                if i + 1 < segments.len() {
                    debug!(skipped = segments.len() - i - 1, "ignoring segments after size");
                }
                return;
            }
            if !matches!(segment, Expr::Method(_)) {
                if let Some(chain) = self.operators.get_mut(depth) {
                    chain.arity += 1;
                }
            }
            self.visit(segment, Parent::Chain);
        }
        self.close(depth);
    }

    /// Push an operator that is reduced by [`Machine::close`]; returns its depth.
    fn open(&mut self, kind: OperatorKind, arity: usize) -> usize {
        self.push_operator(kind, arity);
        self.operators.len() - 1
    }

    /// Reduce every record at or above `depth`.
    fn close(&mut self, depth: usize) {
        while self.operators.len() > depth {
            let Some(op) = self.operators.pop() else {
                break;
            };
            self.reduce(op);
        }
    }

    fn push_operator(&mut self, kind: OperatorKind, arity: usize) {
        if let Some(top) = self.operators.last() {
            if !top.kind.reduces_on_close()
                && top.kind.binding_power() <= kind.binding_power()
                && top.is_complete(self.operands.len())
            {
                if let Some(top) = self.operators.pop() {
                    self.reduce(top);
                }
            }
        }
        self.operators.push(PendingOperator {
            kind,
            arity,
            offset: self.operands.len(),
        });
    }

    fn finish(&mut self) {
        self.close(0);
        trace!(remaining = self.operands.len(), "probe finished");
    }

    fn pop_operand(&mut self, op: &OperatorKind) -> Option<Operand> {
        let operand = self.operands.pop();
        if operand.is_none() {
            warn!(operator = %op, "operator is missing an operand");
        }
        operand
    }

    fn reduce(&mut self, op: PendingOperator) {
        trace!(operator = %op.kind, arity = op.arity, offset = op.offset, "reduce");
        match &op.kind {
            OperatorKind::Compare(cmp) => self.reduce_compare(*cmp, &op.kind),
            OperatorKind::Not => self.reduce_not(&op.kind),
            OperatorKind::Eval => self.reduce_eval(&op.kind),
            OperatorKind::Logical(logical) => self.reduce_logical(*logical, &op),
            OperatorKind::Negate => self.reduce_negate(&op.kind),
            OperatorKind::Chain => self.reduce_chain(&op),
            OperatorKind::Size => self.reduce_size(),
            OperatorKind::Opaque(name) => {
                debug!(method = %name, "no synthesis rule for method");
            }
        }
    }

    fn reduce_compare(&mut self, cmp: CompareOp, kind: &OperatorKind) {
        let right = self.pop_operand(kind);
        let left = self.pop_operand(kind);

        let (key, other) = match (left, right) {
            (Some(Operand::Path(key)), other) => (key, other),
            (other, Some(Operand::Path(key))) => (key, other),
            (left, right) => {
                warn!(operator = %cmp, ?left, ?right, "comparison has no property operand");
                self.operands.push(Operand::Value(Value::Bool(true)));
                return;
            }
        };

        let other = match other {
            Some(Operand::Value(value)) => value,
            Some(Operand::Path(name)) => match self.bindings.get(&name) {
                Some(value) => value.clone(),
                None => {
                    warn!(property = %key, other = %name, "comparison against an unbound property");
                    Value::Unbound
                }
            },
            None => Value::Unbound,
        };

        let value = self.satisfy(cmp, &key, other);
        trace!(property = %key, %value, "bind");
        self.bindings.put(&key, value);
        self.operands.push(Operand::Value(Value::Bool(true)));
    }

    /// A value `v` such that `v <cmp> other` holds.
    fn satisfy(&self, cmp: CompareOp, key: &str, other: Value) -> Value {
        match cmp {
            CompareOp::Eq => other,
            CompareOp::NotEq => match other {
                Value::Int(n) => Value::Int(n.wrapping_add(1)),
                Value::Float(x) => Value::Float(x + 1.0),
                Value::Bool(b) => Value::Bool(!b),
                Value::Str(s) if s.is_empty() => Value::Str(self.settings.not_empty_sentinel.clone()),
                Value::Str(_) => Value::Str(String::new()),
                Value::Null => Value::NonNullUnknown,
                Value::NonNullUnknown => Value::Null,
                other => ambiguous(cmp, key, other),
            },
            CompareOp::Gt | CompareOp::GtEq => match other {
                Value::Int(n) => Value::Int(n.wrapping_add(1)),
                Value::Float(x) => Value::Float(x + 1.0),
                Value::Bool(_) => Value::Bool(true),
                Value::Str(s) => Value::Str(format!("{s}_greater")),
                other => ambiguous(cmp, key, other),
            },
            CompareOp::Lt | CompareOp::LtEq => match other {
                Value::Int(n) => Value::Int(n.wrapping_sub(1)),
                Value::Float(x) => Value::Float(x - 1.0),
                Value::Bool(_) => Value::Bool(false),
                Value::Str(s) => Value::Str(format!("{s}_less")),
                other => ambiguous(cmp, key, other),
            },
        }
    }

    fn reduce_not(&mut self, kind: &OperatorKind) {
        let result = match self.pop_operand(kind) {
            // A bare property under `!` stays bindable
            Some(Operand::Path(name)) => Operand::Path(name),
            Some(Operand::Value(value)) => Operand::Value(match value {
                Value::Null | Value::Unbound => Value::Bool(true),
                Value::Bool(b) => Value::Bool(!b),
                Value::Str(s) => Value::Bool(s.is_empty()),
                other => other,
            }),
            None => Operand::Value(Value::Unbound),
        };
        self.operands.push(result);
    }

    fn reduce_eval(&mut self, kind: &OperatorKind) {
        match self.pop_operand(kind) {
            Some(Operand::Path(name)) => self.bindings.put(&name, Value::Bool(true)),
            Some(Operand::Value(value)) => {
                debug!(%value, "truth assertion on a non-property operand");
            }
            None => {}
        }
        self.operands.push(Operand::Value(Value::Bool(true)));
    }

    fn reduce_logical(&mut self, logical: LogicalOp, op: &PendingOperator) {
        let available = self.operands.len().saturating_sub(op.offset);
        if available < op.arity {
            warn!(operator = %logical, expected = op.arity, available, "logical operator is missing operands");
        }
        let take = op.arity.min(available);
        let popped = self.operands.split_off(self.operands.len() - take);
        let mut truths = popped.into_iter().map(|operand| match operand {
            Operand::Value(Value::Bool(b)) => b,
            Operand::Value(_) => false,
            Operand::Path(name) => self.bindings.get(&name).is_some_and(Value::truthy),
        });
        let result = match logical {
            LogicalOp::And => truths.all(|b| b),
            LogicalOp::Or => truths.any(|b| b),
        };
        self.operands.push(Operand::Value(Value::Bool(result)));
    }

    fn reduce_negate(&mut self, kind: &OperatorKind) {
        let result = match self.pop_operand(kind) {
            Some(Operand::Value(Value::Int(n))) => Operand::Value(Value::Int(n.wrapping_neg())),
            Some(Operand::Value(Value::Float(x))) => Operand::Value(Value::Float(-x)),
            Some(other) => other,
            None => Operand::Value(Value::Unbound),
        };
        self.operands.push(result);
    }

    fn reduce_chain(&mut self, op: &PendingOperator) {
        let offset = op.offset.min(self.operands.len());
        let mut above = self.operands.split_off(offset);
        let take = op.arity.min(above.len());
        let rest = above.split_off(take);

        let joined = above
            .iter()
            .map(|operand| match operand {
                Operand::Path(name) => name.clone(),
                Operand::Value(value) => value.render_text(""),
            })
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(".");

        if joined.is_empty() {
            warn!("property chain without named segments");
        } else {
            self.bindings.put(&joined, Value::NonNullUnknown);
            self.operands.push(Operand::Path(joined));
        }
        self.operands.extend(rest);
    }

    fn reduce_size(&mut self) {
        let nearest = self.operands.iter().rev().find_map(|operand| match operand {
            Operand::Path(name) => Some(name.clone()),
            Operand::Value(_) => None,
        });
        match nearest {
            Some(name) => self.bindings.put(&name, Value::Seq(Vec::new())),
            None => warn!("size without a property to measure"),
        }
    }
}

fn is_size_segment(segment: &Expr) -> bool {
    matches!(segment, Expr::Property(name) | Expr::Method(name) if name == SIZE)
}

fn ambiguous(cmp: CompareOp, key: &str, other: Value) -> Value {
    warn!(property = %key, operator = %cmp, %other, "cannot synthesize a satisfying value");
    Value::Unbound
}
