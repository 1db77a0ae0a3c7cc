//! Mapped statement catalogs.
//!
//! A catalog lists the mapped statements of an application together with the
//! parameter types their INSERTs use. It is read from TOML or JSON, chosen by
//! file extension:
//!
//! ```toml
//! [[statements]]
//! id = "UserMapper.insert"
//! kind = "insert"
//! parameter_type = "User"
//! template = { type = "static_text", text = "INSERT INTO t_user (name) VALUES (#{name})" }
//!
//! [types.User]
//! fields = [{ name = "name", kind = "string" }]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::params::ParameterType;
use crate::template::Segment;

/// Error type for catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported catalog format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// The SQL command a statement issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Callable,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Callable => "callable",
        };
        f.write_str(name)
    }
}

/// One mapped statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedStatement {
    pub id: String,
    pub kind: StatementKind,
    pub template: Segment,
    #[serde(default)]
    pub parameter_type: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
}

/// Statements plus the parameter types they reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub statements: Vec<MappedStatement>,
    pub types: BTreeMap<String, ParameterType>,
}

impl Catalog {
    /// Load a catalog from a `.toml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        Ok(catalog.with_type_names())
    }

    pub fn from_json_str(content: &str) -> CatalogResult<Self> {
        let catalog: Catalog = serde_json::from_str(content)?;
        Ok(catalog.with_type_names())
    }

    pub fn parameter_type(&self, name: &str) -> Option<&ParameterType> {
        self.types.get(name)
    }

    /// Types are keyed by name; fill in the name where the entry omits it.
    fn with_type_names(mut self) -> Self {
        for (name, ty) in &mut self.types {
            if ty.name.is_empty() {
                ty.name = name.clone();
            }
        }
        self
    }
}
