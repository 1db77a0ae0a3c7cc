//! Parameter objects for INSERT-style statements.
//!
//! An INSERT template usually names the fields of its parameter type
//! (`#{name}`, `#{age}`) without guarding them. Instead of walking the
//! template, an object is built from the type's field list with a fixed
//! default per field kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ParamSettings;
use crate::value::Value;

/// Declared kind of a parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Long,
    Decimal,
    Double,
    /// Anything else; left null.
    #[serde(other)]
    Other,
}

/// One field of a parameter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            is_final: false,
        }
    }

    /// Static and final fields are never assigned.
    pub fn is_assignable(&self) -> bool {
        !self.is_static && !self.is_final
    }
}

/// Shape of a parameter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterType {
    #[serde(default)]
    pub name: String,
    /// Whether a no-argument constructor exists.
    #[serde(default = "default_instantiable")]
    pub instantiable: bool,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_instantiable() -> bool {
    true
}

impl ParameterType {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            instantiable: true,
            fields,
        }
    }
}

/// Builds default-filled parameter objects.
#[derive(Debug, Clone)]
pub struct ParameterSynthesizer<'a> {
    settings: &'a ParamSettings,
}

impl<'a> ParameterSynthesizer<'a> {
    pub fn new(settings: &'a ParamSettings) -> Self {
        Self { settings }
    }

    /// A mapping with every assignable field set to its kind's default.
    ///
    /// Returns `None` when the type cannot be instantiated.
    pub fn synthesize(&self, ty: &ParameterType) -> Option<Value> {
        if !ty.instantiable {
            warn!(parameter_type = %ty.name, "no usable constructor; skipping");
            return None;
        }

        let fields: BTreeMap<String, Value> = ty
            .fields
            .iter()
            .filter(|field| field.is_assignable())
            .map(|field| (field.name.clone(), self.default_for(field.kind)))
            .collect();
        debug!(parameter_type = %ty.name, fields = fields.len(), "synthesized parameter object");
        Some(Value::Map(fields))
    }

    fn default_for(&self, kind: FieldKind) -> Value {
        match kind {
            FieldKind::String => Value::Str(self.settings.string_sentinel.clone()),
            FieldKind::Boolean => Value::Bool(true),
            FieldKind::Integer | FieldKind::Long => Value::Int(0),
            FieldKind::Decimal | FieldKind::Double => Value::Float(0.0),
            FieldKind::Other => Value::Null,
        }
    }
}
