//! `sqlparser`-backed SELECT inspection.

use std::ops::ControlFlow;

use sqlparser::ast::{BinaryOperator, Expr, Statement, TableFactor, Visit, Visitor};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use tracing::trace;

use super::{ColumnRef, SelectShape, SqlAstProvider, SqlError, SqlResult, TableRef};
use crate::config::SqlDialect;

/// Parses SELECT statements with `sqlparser`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParserProvider {
    dialect: SqlDialect,
}

impl SqlParserProvider {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self.dialect {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::Mysql => Box::new(MySqlDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }
}

impl SqlAstProvider for SqlParserProvider {
    fn select_shape(&self, sql: &str) -> SqlResult<SelectShape> {
        let dialect = self.parser_dialect();
        let statements =
            Parser::parse_sql(&*dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
        let statement = statements.into_iter().next().ok_or(SqlError::Empty)?;
        if !matches!(statement, Statement::Query(_)) {
            return Err(SqlError::NotASelect);
        }

        let mut collector = ShapeCollector::default();
        let _ = statement.visit(&mut collector);
        trace!(
            tables = collector.shape.tables.len(),
            columns = collector.shape.columns.len(),
            "select shape"
        );
        Ok(collector.shape)
    }
}

/// Collects table factors and the column operands of comparisons.
#[derive(Debug, Default)]
struct ShapeCollector {
    shape: SelectShape,
}

impl Visitor for ShapeCollector {
    type Break = ();

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<Self::Break> {
        if let TableFactor::Table { name, alias, .. } = factor {
            if let Some(table) = name.0.last() {
                self.shape.tables.push(TableRef {
                    name: table.value.clone(),
                    alias: alias.as_ref().map(|a| a.name.value.clone()),
                });
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if let Expr::BinaryOp { left, op, right } = expr {
            if is_comparison(op) {
                self.shape.columns.extend(column_ref(left));
                self.shape.columns.extend(column_ref(right));
            }
        }
        ControlFlow::Continue(())
    }
}

fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
    )
}

fn column_ref(expr: &Expr) -> Option<ColumnRef> {
    match expr {
        Expr::Identifier(ident) => Some(ColumnRef {
            qualifier: None,
            name: ident.value.clone(),
        }),
        Expr::CompoundIdentifier(parts) if parts.len() >= 2 => Some(ColumnRef {
            qualifier: Some(parts[parts.len() - 2].value.clone()),
            name: parts.last()?.value.clone(),
        }),
        Expr::Nested(inner) => column_ref(inner),
        _ => None,
    }
}
