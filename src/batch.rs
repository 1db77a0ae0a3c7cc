//! End-to-end run over a catalog.
//!
//! ```text
//! Catalog ──► per statement ──► bindings ──► render ──► SQL
//!               select: walk template          │
//!               insert: synthesize params      ▼
//!                                    JoinFinder over SELECTs
//!                                              │
//!                                   AssociationGraph ──► Diagram
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Write};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, MappedStatement, StatementKind};
use crate::config::Settings;
use crate::graph::{AssociationGraph, Diagram};
use crate::join::{JoinFinder, Match};
use crate::params::ParameterSynthesizer;
use crate::sql::{insert_table, strip_comments, unquote, SqlAstProvider, SqlParserProvider};
use crate::template::{LiteralRenderer, SqlRenderer, TemplateWalker};
use crate::value::{Bindings, Value};

/// Errors that abort a batch run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("catalog contains no statements")]
    NoStatements,
}

pub type BatchResult<T> = Result<T, BatchError>;

/// Why a statement produced no SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Stored procedure calls are never analysed.
    Callable,
    /// UPDATE and DELETE statements are not rendered.
    NotAnalysed(StatementKind),
    MissingParameterType,
    UnknownParameterType(String),
    NotInstantiable(String),
    Render(String),
    EmptySql,
    /// A rendered SELECT the SQL parser rejects.
    InvalidSql(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Callable => write!(f, "callable statement"),
            SkipReason::NotAnalysed(kind) => write!(f, "{kind} statements are not analysed"),
            SkipReason::MissingParameterType => write!(f, "insert without a parameter type"),
            SkipReason::UnknownParameterType(name) => write!(f, "unknown parameter type '{name}'"),
            SkipReason::NotInstantiable(name) => write!(f, "parameter type '{name}' cannot be instantiated"),
            SkipReason::Render(err) => write!(f, "render failed: {err}"),
            SkipReason::EmptySql => write!(f, "rendered SQL is empty"),
            SkipReason::InvalidSql(err) => write!(f, "rendered SQL does not parse: {err}"),
        }
    }
}

/// A statement rendered to SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedStatement {
    pub id: String,
    pub kind: StatementKind,
    pub sql: String,
}

/// A statement that produced no SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStatement {
    pub id: String,
    pub reason: SkipReason,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Rendered statements in catalog order.
    pub rendered: Vec<RenderedStatement>,
    pub skipped: Vec<SkippedStatement>,
    pub matches: BTreeSet<Match>,
    /// Parameter or result type → tables it was seen with.
    pub type_tables: BTreeMap<String, BTreeSet<String>>,
    pub diagram: Diagram,
}

impl BatchReport {
    pub fn selects(&self) -> impl Iterator<Item = &RenderedStatement> {
        self.rendered
            .iter()
            .filter(|statement| statement.kind == StatementKind::Select)
    }
}

/// Runs the whole pipeline over a catalog.
pub struct Batch<'a> {
    settings: &'a Settings,
    renderer: Box<dyn SqlRenderer + 'a>,
    provider: Box<dyn SqlAstProvider + 'a>,
}

impl<'a> Batch<'a> {
    /// A batch using [`LiteralRenderer`] and [`SqlParserProvider`].
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            renderer: Box::new(LiteralRenderer::new(settings.probe.non_null_marker.clone())),
            provider: Box::new(SqlParserProvider::new(settings.sql.dialect)),
        }
    }

    pub fn with_renderer(mut self, renderer: impl SqlRenderer + 'a) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_provider(mut self, provider: impl SqlAstProvider + 'a) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn run(&self, catalog: &Catalog) -> BatchResult<BatchReport> {
        if catalog.statements.is_empty() {
            return Err(BatchError::NoStatements);
        }

        let walker = TemplateWalker::new(&self.settings.probe, &self.settings.text);
        let synthesizer = ParameterSynthesizer::new(&self.settings.params);
        let mut report = BatchReport::default();

        for statement in &catalog.statements {
            match self.render_statement(statement, catalog, &walker, &synthesizer) {
                Ok(sql) => {
                    debug!(id = %statement.id, %sql, "rendered");
                    self.index_type(statement, &sql, &mut report.type_tables);
                    report.rendered.push(RenderedStatement {
                        id: statement.id.clone(),
                        kind: statement.kind,
                        sql,
                    });
                }
                Err(reason) => {
                    if reason == SkipReason::Callable {
                        debug!(id = %statement.id, "skipping callable statement");
                    } else {
                        warn!(id = %statement.id, %reason, "skipping statement");
                    }
                    report.skipped.push(SkippedStatement {
                        id: statement.id.clone(),
                        reason,
                    });
                }
            }
        }

        let finder = JoinFinder::new(self.provider.as_ref());
        report.matches = finder.analyse_all(report.selects().map(|s| s.sql.as_str()));
        report.diagram = AssociationGraph::from_matches(&report.matches).diagram();

        info!(
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            matches = report.matches.len(),
            tables = report.diagram.nodes.len(),
            "batch finished"
        );
        Ok(report)
    }

    fn render_statement(
        &self,
        statement: &MappedStatement,
        catalog: &Catalog,
        walker: &TemplateWalker<'_>,
        synthesizer: &ParameterSynthesizer<'_>,
    ) -> Result<String, SkipReason> {
        let bindings = match statement.kind {
            StatementKind::Callable => return Err(SkipReason::Callable),
            StatementKind::Update | StatementKind::Delete => {
                return Err(SkipReason::NotAnalysed(statement.kind))
            }
            StatementKind::Select => walker.bindings_for(&statement.template),
            StatementKind::Insert => {
                let name = statement
                    .parameter_type
                    .as_deref()
                    .ok_or(SkipReason::MissingParameterType)?;
                let ty = catalog
                    .parameter_type(name)
                    .ok_or_else(|| SkipReason::UnknownParameterType(name.to_string()))?;
                match synthesizer.synthesize(ty) {
                    Some(Value::Map(object)) => Bindings::from_map(object),
                    _ => return Err(SkipReason::NotInstantiable(name.to_string())),
                }
            }
        };

        let raw = self
            .renderer
            .render(&statement.template, &bindings)
            .map_err(|err| SkipReason::Render(err.to_string()))?;
        let sql = strip_comments(&raw);
        if sql.is_empty() {
            return Err(SkipReason::EmptySql);
        }
        if statement.kind == StatementKind::Select {
            self.provider
                .select_shape(&sql)
                .map_err(|err| SkipReason::InvalidSql(err.to_string()))?;
        }
        Ok(sql)
    }

    fn index_type(
        &self,
        statement: &MappedStatement,
        sql: &str,
        type_tables: &mut BTreeMap<String, BTreeSet<String>>,
    ) {
        let (type_name, table) = match statement.kind {
            StatementKind::Insert => (statement.parameter_type.as_ref(), insert_table(sql)),
            StatementKind::Select => (
                statement.result_type.as_ref(),
                statement
                    .result_type
                    .as_ref()
                    .and_then(|_| self.provider.first_table(sql)),
            ),
            _ => return,
        };
        if let (Some(type_name), Some(table)) = (type_name, table) {
            type_tables
                .entry(type_name.clone())
                .or_default()
                .insert(unquote(&table));
        }
    }
}

/// Write every rendered SELECT followed by `;`, one per line.
pub fn write_sql_dump<W: Write>(report: &BatchReport, mut writer: W) -> io::Result<()> {
    for statement in &report.rendered {
        let is_select = statement
            .sql
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("select"));
        if is_select {
            writeln!(writer, "{};", statement.sql)?;
        }
    }
    writer.flush()
}
