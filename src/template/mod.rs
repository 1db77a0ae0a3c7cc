//! Dynamic SQL templates.
//!
//! A template is a tree of [`Segment`]s: literal text, text with `${...}`
//! substitutions, guarded bodies, choice sets, repeats over collections and
//! trimmed regions.
//!
//! Two passes run over a template:
//! - [`TemplateWalker`] visits every segment and synthesizes bindings that
//!   switch on every guarded region
//! - a [`SqlRenderer`] turns the template plus bindings into SQL text

mod render;
mod text;
mod walker;

pub use render::{LiteralRenderer, RenderError, RenderResult, SqlRenderer};
pub use text::bind_placeholders;
pub use walker::TemplateWalker;

use serde::{Deserialize, Serialize};

/// A node in a template tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Children rendered in order.
    Sequence { children: Vec<Segment> },

    /// Text with nothing to substitute except `#{...}` parameters.
    StaticText { text: String },

    /// Text containing `${...}` substitutions.
    DynamicText { text: String },

    /// Body included when `test` holds.
    Conditional { test: String, body: Box<Segment> },

    /// The first `when` whose test holds, otherwise `default`.
    ChoiceSet {
        whens: Vec<When>,
        #[serde(default)]
        default: Option<Box<Segment>>,
    },

    /// Body repeated once per element of `collection`.
    Repeat {
        collection: String,
        #[serde(default = "default_item")]
        item: String,
        #[serde(default)]
        index: Option<String>,
        #[serde(default)]
        open: String,
        #[serde(default)]
        close: String,
        #[serde(default)]
        separator: String,
        body: Box<Segment>,
    },

    /// Body with prefix/suffix added and leading/trailing keywords removed.
    Trimmed {
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
        #[serde(default)]
        prefix_overrides: Vec<String>,
        #[serde(default)]
        suffix_overrides: Vec<String>,
        body: Box<Segment>,
    },

    /// Opaque text the walker ignores.
    PassThrough {
        #[serde(default)]
        text: String,
    },
}

/// A guarded branch of a [`Segment::ChoiceSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct When {
    pub test: String,
    pub body: Segment,
}

fn default_item() -> String {
    "item".to_string()
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::StaticText { text: text.into() }
    }

    pub fn dynamic(text: impl Into<String>) -> Self {
        Segment::DynamicText { text: text.into() }
    }

    pub fn sequence(children: Vec<Segment>) -> Self {
        Segment::Sequence { children }
    }

    pub fn when(test: impl Into<String>, body: Segment) -> Self {
        Segment::Conditional {
            test: test.into(),
            body: Box::new(body),
        }
    }

    /// A `WHERE` region: prefixed with `WHERE`, leading `AND`/`OR` removed.
    pub fn where_clause(body: Segment) -> Self {
        Segment::Trimmed {
            prefix: "WHERE".to_string(),
            suffix: String::new(),
            prefix_overrides: vec!["AND ".to_string(), "OR ".to_string()],
            suffix_overrides: Vec::new(),
            body: Box::new(body),
        }
    }

    /// A `SET` region: prefixed with `SET`, trailing comma removed.
    pub fn set_clause(body: Segment) -> Self {
        Segment::Trimmed {
            prefix: "SET".to_string(),
            suffix: String::new(),
            prefix_overrides: Vec::new(),
            suffix_overrides: vec![",".to_string()],
            body: Box::new(body),
        }
    }
}
