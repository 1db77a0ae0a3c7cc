//! Rendering templates to SQL text.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use super::text::{placeholder_name, PLACEHOLDER};
use super::Segment;
use crate::expr::{parse, ParseError};
use crate::value::{Bindings, Value, NON_NULL_MARKER};

static PARAMETER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\{[^}]*\}").unwrap());

/// Errors produced while rendering a template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("invalid test expression '{test}': {source}")]
    Expression {
        test: String,
        #[source]
        source: ParseError,
    },

    #[error("collection '{collection}' is {found}, expected a sequence")]
    NotACollection { collection: String, found: String },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Turns a template and a binding context into SQL text.
pub trait SqlRenderer {
    fn render(&self, template: &Segment, bindings: &Bindings) -> RenderResult<String>;
}

/// Renders `#{...}` parameters as `?` and splices `${...}` values literally.
///
/// Segments are joined with single spaces; callers normalize whitespace.
#[derive(Debug, Clone)]
pub struct LiteralRenderer {
    non_null_marker: String,
}

impl Default for LiteralRenderer {
    fn default() -> Self {
        Self::new(NON_NULL_MARKER)
    }
}

impl SqlRenderer for LiteralRenderer {
    fn render(&self, template: &Segment, bindings: &Bindings) -> RenderResult<String> {
        let mut out = String::new();
        self.render_into(template, bindings, &mut out)?;
        Ok(out.trim().to_string())
    }
}

impl LiteralRenderer {
    pub fn new(non_null_marker: impl Into<String>) -> Self {
        Self {
            non_null_marker: non_null_marker.into(),
        }
    }

    fn render_into(&self, segment: &Segment, scope: &Bindings, out: &mut String) -> RenderResult<()> {
        match segment {
            Segment::Sequence { children } => {
                for child in children {
                    self.render_into(child, scope, out)?;
                }
            }
            Segment::StaticText { text } | Segment::DynamicText { text } => {
                append(out, &self.substitute(text, scope));
            }
            Segment::PassThrough { text } => append(out, text),
            Segment::Conditional { test, body } => {
                if holds(test, scope)? {
                    self.render_into(body, scope, out)?;
                }
            }
            Segment::ChoiceSet { whens, default } => {
                for when in whens {
                    if holds(&when.test, scope)? {
                        return self.render_into(&when.body, scope, out);
                    }
                }
                if let Some(default) = default {
                    self.render_into(default, scope, out)?;
                }
            }
            Segment::Repeat {
                collection,
                item,
                index,
                open,
                close,
                separator,
                body,
            } => {
                let items = match scope.get(collection) {
                    Some(Value::Seq(items)) => items,
                    other => {
                        return Err(RenderError::NotACollection {
                            collection: collection.clone(),
                            found: other.map_or("unbound".to_string(), Value::to_string),
                        })
                    }
                };

                let mut parts = Vec::with_capacity(items.len());
                for (i, element) in items.iter().enumerate() {
                    let mut local = scope.clone();
                    local.shadow(item, element.clone());
                    if let Some(index) = index {
                        local.shadow(index, Value::Int(i as i64));
                    }
                    let mut part = String::new();
                    self.render_into(body, &local, &mut part)?;
                    parts.push(part.trim().to_string());
                }
                append(out, &format!("{open}{}{close}", parts.join(separator)));
            }
            Segment::Trimmed {
                prefix,
                suffix,
                prefix_overrides,
                suffix_overrides,
                body,
            } => {
                let mut inner = String::new();
                self.render_into(body, scope, &mut inner)?;
                let collapsed = inner.split_whitespace().collect::<Vec<_>>().join(" ");
                if collapsed.is_empty() {
                    return Ok(());
                }
                let mut content = collapsed.as_str();
                if let Some(rest) = prefix_overrides
                    .iter()
                    .find_map(|o| strip_prefix_ignore_case(content, o))
                {
                    content = rest;
                }
                if let Some(rest) = suffix_overrides
                    .iter()
                    .find_map(|o| strip_suffix_ignore_case(content, o))
                {
                    content = rest;
                }
                append(out, prefix);
                append(out, content.trim());
                append(out, suffix);
            }
        }
        Ok(())
    }

    fn substitute(&self, text: &str, scope: &Bindings) -> String {
        let spliced = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
            let name = placeholder_name(&caps[1]);
            scope
                .get(name)
                .map(|value| value.render_text(&self.non_null_marker))
                .unwrap_or_default()
        });
        PARAMETER.replace_all(&spliced, "?").into_owned()
    }
}

fn holds(test: &str, scope: &Bindings) -> RenderResult<bool> {
    let expr = parse(test).map_err(|source| RenderError::Expression {
        test: test.to_string(),
        source,
    })?;
    Ok(expr.holds(scope))
}

fn append(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(text);
}

fn strip_prefix_ignore_case<'s>(s: &'s str, prefix: &str) -> Option<&'s str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| s.get(prefix.len()..))
        .flatten()
}

fn strip_suffix_ignore_case<'s>(s: &'s str, suffix: &str) -> Option<&'s str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix)
        .then(|| s.get(..split))
        .flatten()
}
