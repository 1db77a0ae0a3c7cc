//! Join inference over rendered SELECT statements.
//!
//! A statement is trusted only when every table it declares is referenced
//! by qualifier in its predicates and nothing else is. Predicate columns are
//! then paired up from the end, each pair becoming a [`Match`] between two
//! table columns.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::sql::{unquote, ColumnRef, SqlAstProvider};

/// A column of a named table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableColumn {
    pub table: String,
    pub column: String,
}

impl TableColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for TableColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// An inferred relationship between two table columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Match {
    pub left: TableColumn,
    pub right: TableColumn,
}

impl Match {
    pub fn new(
        left_table: impl Into<String>,
        left_column: impl Into<String>,
        right_table: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        Self {
            left: TableColumn::new(left_table, left_column),
            right: TableColumn::new(right_table, right_column),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

/// Infers [`Match`]es from SELECT statements.
pub struct JoinFinder<'p> {
    provider: &'p dyn SqlAstProvider,
}

impl<'p> JoinFinder<'p> {
    pub fn new(provider: &'p dyn SqlAstProvider) -> Self {
        Self { provider }
    }

    /// Matches implied by one statement; empty when it is rejected.
    pub fn analyse(&self, sql: &str) -> BTreeSet<Match> {
        let shape = match self.provider.select_shape(sql) {
            Ok(shape) => shape,
            Err(err) => {
                warn!(%err, sql, "skipping statement");
                return BTreeSet::new();
            }
        };

        let aliases: HashMap<&str, &str> = shape
            .tables
            .iter()
            .map(|table| (table.qualifier(), table.name.as_str()))
            .collect();
        let declared: HashSet<&str> = aliases.keys().copied().collect();
        let qualifiers: HashSet<&str> = shape
            .columns
            .iter()
            .map(|column| column.qualifier.as_deref().unwrap_or(""))
            .collect();

        if shape.columns.is_empty()
            || qualifiers != declared
            || qualifiers.len() != shape.tables.len()
        {
            debug!(sql, "SQL has no join");
            return BTreeSet::new();
        }
        if shape.columns.len() % 2 != 0 {
            debug!(sql, columns = shape.columns.len(), "odd number of predicate columns");
            return BTreeSet::new();
        }
        debug!(sql, "SQL has join");

        let resolve = |column: &ColumnRef| {
            let qualifier = column.qualifier.as_deref().unwrap_or("");
            let table = aliases.get(qualifier).copied().unwrap_or(qualifier);
            TableColumn::new(unquote(table), unquote(&column.name))
        };

        let mut matches = BTreeSet::new();
        let mut columns = shape.columns;
        while columns.len() >= 2 {
            let (Some(right), Some(left)) = (columns.pop(), columns.pop()) else {
                break;
            };
            let found = Match {
                left: resolve(&left),
                right: resolve(&right),
            };
            info!(%found, "inferred match");
            matches.insert(found);
        }
        matches
    }

    /// Union of the matches of every statement.
    pub fn analyse_all<I, S>(&self, statements: I) -> BTreeSet<Match>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        statements
            .into_iter()
            .flat_map(|sql| self.analyse(sql.as_ref()))
            .collect()
    }
}
