//! Graphviz output for diagrams.

use std::io::{self, Write};

use super::Diagram;

/// Destination for a finished diagram.
pub trait DiagramSink {
    fn write_diagram(&mut self, diagram: &Diagram) -> io::Result<()>;
}

/// Writes diagrams as Graphviz DOT text.
#[derive(Debug)]
pub struct DotSink<W> {
    writer: W,
}

impl<W: Write> DotSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagramSink for DotSink<W> {
    fn write_diagram(&mut self, diagram: &Diagram) -> io::Result<()> {
        self.writer.write_all(to_dot(diagram).as_bytes())?;
        self.writer.flush()
    }
}

/// Render a diagram as an undirected `ERD` graph.
///
/// Each table is a plain-shaped node whose HTML-like label lists its columns
/// as ports; edges connect `table:column` ports.
pub fn to_dot(diagram: &Diagram) -> String {
    let mut out = String::from("graph ERD {\n");
    for node in &diagram.nodes {
        let mut label = String::from(r#"<table border="0" cellborder="1" cellspacing="0">"#);
        label.push_str(&format!("<tr><td><b>{}</b></td></tr>", escape(&node.table)));
        for column in &node.columns {
            label.push_str(&format!(
                r#"<tr><td port="{}">{}</td></tr>"#,
                escape(column),
                escape(column)
            ));
        }
        label.push_str("</table>");
        out.push_str(&format!("{} [shape=plain label=<{}>];\n", id(&node.table), label));
    }
    for edge in &diagram.edges {
        out.push_str(&format!(
            "{}:{} -- {}:{};\n",
            id(&edge.left.table),
            id(&edge.left.column),
            id(&edge.right.table),
            id(&edge.right.column)
        ));
    }
    out.push_str("}\n");
    out
}

/// Quote a DOT identifier unless it is a plain word.
fn id(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\\\""))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
