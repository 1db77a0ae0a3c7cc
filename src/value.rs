//! Synthesized parameter values and the binding context they live in.
//!
//! A [`Bindings`] context maps property names to [`Value`]s. Dotted names
//! (`account.userId`) address nested mappings, which are created on demand.
//! Writes follow a merge policy so that successive guards refine a context
//! rather than erase what earlier guards established.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

/// Marker serialized for values known only to be non-null.
pub const NON_NULL_MARKER: &str = "__non_null__";

/// Upper bound on the length a sequence is grown to by a size constraint.
pub const MAX_SYNTHETIC_LEN: usize = 1024;

/// A synthesized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nothing is known; the slot was never constrained.
    Unbound,
    /// Explicit null.
    Null,
    /// Known to be non-null, nothing else.
    NonNullUnknown,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(BTreeMap<String, Value>),
    Seq(Vec<Value>),
}

impl Value {
    /// An empty mapping.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Booleans, numbers and strings.
    pub fn is_concrete_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Null or never bound.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Unbound)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Look up a direct member of a mapping.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(name),
            _ => None,
        }
    }

    /// Truthiness used when a value stands in a boolean position.
    ///
    /// Null and unbound are false, zero is false, the empty string is false,
    /// everything else is true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Unbound | Value::Null => false,
            Value::NonNullUnknown => true,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Map(_) | Value::Seq(_) => true,
        }
    }

    /// Text substituted for a `${...}` placeholder bound to this value.
    pub fn render_text(&self, non_null_marker: &str) -> String {
        match self {
            Value::Unbound | Value::Null => String::new(),
            Value::NonNullUnknown => non_null_marker.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Seq(items) => items
                .iter()
                .map(|item| item.render_text(non_null_marker))
                .collect::<Vec<_>>()
                .join(", "),
            Value::Map(_) => String::new(),
        }
    }

    /// JSON form of this value, writing `non_null_marker` for values known
    /// only to be non-null.
    pub fn to_json(&self, non_null_marker: &str) -> serde_json::Value {
        match self {
            Value::Unbound | Value::Null => serde_json::Value::Null,
            Value::NonNullUnknown => serde_json::Value::from(non_null_marker),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(x) => serde_json::Value::from(*x),
            Value::Str(s) => serde_json::Value::from(s.as_str()),
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json(non_null_marker)))
                    .collect(),
            ),
            Value::Seq(items) => serde_json::Value::Array(
                items.iter().map(|item| item.to_json(non_null_marker)).collect(),
            ),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Unbound => "unbound",
            Value::Null => "null",
            Value::NonNullUnknown => "non-null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Map(_) => "mapping",
            Value::Seq(_) => "sequence",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unbound => write!(f, "<unbound>"),
            Value::Null => write!(f, "null"),
            Value::NonNullUnknown => write!(f, "<non-null>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A mutable name-to-value context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    root: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping, e.g. a synthesized parameter object.
    pub fn from_map(root: BTreeMap<String, Value>) -> Self {
        Self { root }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// JSON object of every top-level binding.
    pub fn to_json(&self, non_null_marker: &str) -> serde_json::Value {
        serde_json::Value::Object(
            self.root
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json(non_null_marker)))
                .collect(),
        )
    }

    /// Resolve a possibly dotted name.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.member(segment)?;
        }
        Some(current)
    }

    /// Bind a top-level name, replacing whatever was there.
    pub fn shadow(&mut self, name: &str, value: Value) {
        self.root.insert(name.to_string(), value);
    }

    /// Write `value` under a possibly dotted name.
    ///
    /// Intermediate mappings are created as needed. Merge policy for an
    /// occupied slot:
    /// - mappings merge key by key into an existing mapping
    /// - mappings and sequences replace anything else
    /// - a non-negative integer put onto a sequence grows it to that length
    /// - a concrete scalar is never replaced by null, non-null or unbound
    /// - otherwise the newer value wins
    pub fn put(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let Some(leaf) = segments.pop() else {
            warn!(path, "ignoring binding with an empty name");
            return;
        };

        let mut scope = &mut self.root;
        for segment in segments {
            let slot = scope.entry(segment.to_string()).or_insert_with(Value::map);
            if !matches!(slot, Value::Map(_)) {
                debug!(path, segment, previous = slot.kind(), "promoting to a mapping");
                *slot = Value::map();
            }
            let Value::Map(next) = slot else {
                return;
            };
            scope = next;
        }
        put_entry(scope, leaf, value);
    }
}

fn put_entry(scope: &mut BTreeMap<String, Value>, key: &str, value: Value) {
    match scope.get_mut(key) {
        Some(existing) => merge(existing, value, key),
        None => {
            scope.insert(key.to_string(), value);
        }
    }
}

fn merge(existing: &mut Value, incoming: Value, key: &str) {
    match (&mut *existing, incoming) {
        (Value::Map(current), Value::Map(entries)) => {
            for (name, value) in entries {
                put_entry(current, &name, value);
            }
        }
        (slot, incoming @ (Value::Map(_) | Value::Seq(_))) => *slot = incoming,
        (Value::Seq(items), Value::Int(len)) if len >= 0 => {
            let wanted = usize::try_from(len).unwrap_or(MAX_SYNTHETIC_LEN);
            if wanted > MAX_SYNTHETIC_LEN {
                warn!(key, len, "capping synthesized sequence length");
            }
            let wanted = wanted.min(MAX_SYNTHETIC_LEN);
            if items.len() < wanted {
                items.resize(wanted, Value::Null);
            }
        }
        (Value::Seq(_) | Value::Map(_), incoming) => {
            debug!(key, incoming = incoming.kind(), "keeping composite value");
        }
        (_, Value::Unbound) => {}
        (slot, incoming @ (Value::Null | Value::NonNullUnknown)) if slot.is_concrete_scalar() => {
            debug!(key, incoming = incoming.kind(), "keeping concrete value");
        }
        (slot, incoming) => *slot = incoming,
    }
}
