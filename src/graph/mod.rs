//! Association graph - table columns connected by inferred matches.
//!
//! Each distinct [`TableColumn`] is a node. Each [`Match`] adds an undirected
//! edge, so repeated or mirrored matches become parallel edges that the
//! diagram later collapses into one.

mod dot;

pub use dot::{to_dot, DiagramSink, DotSink};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;

use crate::join::{Match, TableColumn};

/// Table columns and their inferred partners.
#[derive(Debug, Clone, Default)]
pub struct AssociationGraph {
    /// The underlying undirected graph
    graph: UnGraph<TableColumn, ()>,

    /// Index: table column → NodeIndex
    column_index: HashMap<TableColumn, NodeIndex>,
}

/// A table box in the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramNode {
    pub table: String,
    pub columns: Vec<String>,
}

/// A drawn connection between two table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramEdge {
    pub left: TableColumn,
    pub right: TableColumn,
}

/// Renderer-independent diagram: tables sorted by name, each unordered pair
/// of columns connected at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl AssociationGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_matches<'m>(matches: impl IntoIterator<Item = &'m Match>) -> Self {
        let mut graph = Self::new();
        for found in matches {
            graph.add_match(found);
        }
        graph
    }

    /// Record both directions of a match.
    pub fn add_match(&mut self, found: &Match) {
        let left = self.ensure_node(&found.left);
        let right = self.ensure_node(&found.right);
        self.graph.add_edge(left, right, ());
    }

    fn ensure_node(&mut self, column: &TableColumn) -> NodeIndex {
        if let Some(&idx) = self.column_index.get(column) {
            return idx;
        }
        let idx = self.graph.add_node(column.clone());
        self.column_index.insert(column.clone(), idx);
        idx
    }

    pub fn column_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Every partner of `column`, once per recorded match, sorted.
    pub fn partners(&self, column: &TableColumn) -> Vec<&TableColumn> {
        let Some(&idx) = self.column_index.get(column) else {
            return Vec::new();
        };
        let mut partners: Vec<&TableColumn> = self
            .graph
            .neighbors(idx)
            .filter_map(|other| self.graph.node_weight(other))
            .collect();
        partners.sort();
        partners
    }

    /// Table name → the columns that take part in a match.
    pub fn tables(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut tables: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for column in self.graph.node_weights() {
            tables
                .entry(column.table.as_str())
                .or_default()
                .insert(column.column.as_str());
        }
        tables
    }

    /// Build the diagram, drawing each unordered column pair once.
    pub fn diagram(&self) -> Diagram {
        let tables = self.tables();
        let nodes = tables
            .iter()
            .map(|(table, columns)| DiagramNode {
                table: table.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            })
            .collect();

        let mut drawn: BTreeSet<(&TableColumn, &TableColumn)> = BTreeSet::new();
        let mut edges = Vec::new();
        for column in tables
            .iter()
            .flat_map(|(table, columns)| columns.iter().map(move |c| TableColumn::new(*table, *c)))
        {
            let Some(this) = self
                .column_index
                .get(&column)
                .and_then(|&idx| self.graph.node_weight(idx))
            else {
                continue;
            };
            for partner in self.partners(this) {
                let pair = if this <= partner {
                    (this, partner)
                } else {
                    (partner, this)
                };
                if drawn.insert(pair) {
                    edges.push(DiagramEdge {
                        left: this.clone(),
                        right: partner.clone(),
                    });
                }
            }
        }

        Diagram { nodes, edges }
    }
}
