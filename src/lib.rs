//! # erdprobe
//!
//! Reverse-engineers an entity-relationship diagram from the dynamic SQL
//! templates of a mapper-style persistence layer.
//!
//! ## Architecture
//!
//! Templates are never executed against a database. Instead their guards are
//! probed for parameter values that make them pass, the templates are
//! rendered with those values, and the rendered SELECTs are mined for join
//! predicates:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Catalog (mapped statements + param types)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [walker + probe / synthesizer]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Bindings                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [renderer]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Rendered SQL                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [join finder]
//! ┌─────────────────────────────────────────────────────────┐
//! │        AssociationGraph (table column ↔ table column)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dot]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ERD diagram                           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod catalog;
pub mod config;
pub mod expr;
pub mod graph;
pub mod join;
pub mod params;
pub mod probe;
pub mod sql;
pub mod template;
pub mod value;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::batch::{write_sql_dump, Batch, BatchError, BatchReport};
    pub use crate::catalog::{Catalog, MappedStatement, StatementKind};
    pub use crate::config::Settings;
    pub use crate::expr::{parse, Expr};
    pub use crate::graph::{to_dot, AssociationGraph, Diagram, DiagramSink, DotSink};
    pub use crate::join::{JoinFinder, Match, TableColumn};
    pub use crate::params::{FieldKind, FieldSpec, ParameterSynthesizer, ParameterType};
    pub use crate::probe::Prober;
    pub use crate::sql::{SqlAstProvider, SqlParserProvider};
    pub use crate::template::{LiteralRenderer, Segment, SqlRenderer, TemplateWalker};
    pub use crate::value::{Bindings, Value};
}

pub use batch::{Batch, BatchReport};
pub use value::{Bindings, Value};
