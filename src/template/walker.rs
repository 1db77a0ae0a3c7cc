use tracing::{debug, warn};

use super::text::bind_placeholders;
use super::Segment;
use crate::config::{ProbeSettings, TextSettings};
use crate::expr::parse;
use crate::probe::Prober;
use crate::value::{Bindings, Value};

/// Visits every segment of a template and accumulates the bindings that
/// switch on its guarded regions.
///
/// Every branch of a choice set is visited, so the resulting context is the
/// union of what each branch asks for. When branches disagree on a property,
/// the one visited last wins.
#[derive(Debug, Clone)]
pub struct TemplateWalker<'a> {
    prober: Prober<'a>,
    text: &'a TextSettings,
}

impl<'a> TemplateWalker<'a> {
    pub fn new(probe: &'a ProbeSettings, text: &'a TextSettings) -> Self {
        Self {
            prober: Prober::new(probe),
            text,
        }
    }

    /// Walk `segment`, writing into `bindings`.
    pub fn walk(&self, segment: &Segment, bindings: &mut Bindings) {
        match segment {
            Segment::Sequence { children } => {
                for child in children {
                    self.walk(child, bindings);
                }
            }
            Segment::StaticText { .. } | Segment::PassThrough { .. } => {}
            Segment::DynamicText { text } => bind_placeholders(text, bindings, self.text),
            Segment::Conditional { test, body } => {
                self.guard(test, bindings);
                self.walk(body, bindings);
            }
            Segment::ChoiceSet { whens, default } => {
                if let Some(default) = default {
                    self.walk(default, bindings);
                }
                for when in whens {
                    self.guard(&when.test, bindings);
                    self.walk(&when.body, bindings);
                }
            }
            // Loop variables are local to the body, so it is not walked.
            Segment::Repeat { collection, .. } => {
                bindings.put(collection, Value::Seq(vec![Value::Null]));
            }
            Segment::Trimmed { body, .. } => self.walk(body, bindings),
        }
    }

    /// Walk into a fresh context.
    pub fn bindings_for(&self, segment: &Segment) -> Bindings {
        let mut bindings = Bindings::new();
        self.walk(segment, &mut bindings);
        bindings
    }

    fn guard(&self, test: &str, bindings: &mut Bindings) {
        match parse(test) {
            Ok(expr) => self.prober.probe(&expr, bindings),
            Err(err) => warn!(test, %err, "skipping unparseable test expression"),
        }
        debug!(test, bound = bindings.len(), "guard probed");
    }
}
