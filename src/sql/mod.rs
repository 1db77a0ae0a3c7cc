//! SQL inspection.
//!
//! Rendered statements are handed to an [`SqlAstProvider`], which reports
//! the tables a SELECT reads and the columns its predicates compare. The
//! default provider is backed by `sqlparser`.

mod provider;
mod text;

pub use provider::SqlParserProvider;
pub use text::{collapse_whitespace, insert_table, split_statements, strip_comments, unquote};

use serde::Serialize;
use thiserror::Error;

/// Errors produced while inspecting SQL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqlError {
    #[error("failed to parse SQL: {0}")]
    Parse(String),

    #[error("not a SELECT statement")]
    NotASelect,

    #[error("no SQL statement found")]
    Empty,
}

pub type SqlResult<T> = Result<T, SqlError>;

/// A table in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// The name columns use to qualify this table: its alias if any.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A column operand of a comparison predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

/// Tables and predicate columns of a SELECT, in visitation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectShape {
    pub tables: Vec<TableRef>,
    pub columns: Vec<ColumnRef>,
}

/// Source of SELECT shapes.
pub trait SqlAstProvider {
    /// Inspect a single SELECT statement.
    fn select_shape(&self, sql: &str) -> SqlResult<SelectShape>;

    /// Name of the first table a SELECT reads.
    fn first_table(&self, sql: &str) -> Option<String> {
        let shape = self.select_shape(sql).ok()?;
        shape.tables.into_iter().next().map(|table| table.name)
    }
}
