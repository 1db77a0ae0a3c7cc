//! Bindings for `${...}` text substitutions.
//!
//! A `${name}` placeholder is spliced into SQL verbatim, so its value has to
//! fit the clause around it. The SQL keyword right before a placeholder picks
//! the value: a table name after `FROM`, a column or direction after
//! `ORDER BY`, a number after `LIMIT`. Placeholders separated only by
//! whitespace or commas continue the same cue and take successive values of
//! its cycle. Any other words in between clear the cue.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::config::TextSettings;
use crate::value::{Bindings, Value};

pub(super) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z_][a-z0-9_]*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    From,
    OrderBy,
    Limit,
    Offset,
    Having,
    In,
}

/// Bind every `${...}` placeholder in `text`.
///
/// Placeholders with no recognizable cue are bound to null, which never
/// overwrites a value a guard already established.
pub fn bind_placeholders(text: &str, bindings: &mut Bindings, settings: &TextSettings) {
    let mut state: Option<(Cue, usize)> = None;
    let mut literal_start = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        state = advance(state, &text[literal_start..whole.start()]);
        literal_start = whole.end();

        let name = placeholder_name(inner.as_str());
        if name.is_empty() {
            continue;
        }

        let is_order_key = settings.order_keys.iter().any(|key| key == name);
        let value = match state {
            Some((cue, _)) if is_order_key => last_value(cue, settings),
            Some((cue, position)) => cycle_value(cue, position, settings),
            None if is_order_key => last_value(Cue::OrderBy, settings),
            None => Value::Null,
        };
        trace!(placeholder = name, ?state, %value, "bind text placeholder");
        bindings.put(name, value);
    }
}

/// `${name,jdbcType=VARCHAR}` names `name`.
pub(super) fn placeholder_name(raw: &str) -> &str {
    raw.split(',').next().unwrap_or_default().trim()
}

fn advance(state: Option<(Cue, usize)>, literal: &str) -> Option<(Cue, usize)> {
    let lowered = literal.to_ascii_lowercase();
    let words: Vec<&str> = WORD.find_iter(&lowered).map(|m| m.as_str()).collect();
    match words.as_slice() {
        [] => state.map(|(cue, position)| (cue, position + 1)),
        [.., "order", "by"] => Some((Cue::OrderBy, 0)),
        [.., last] => keyword_cue(last).map(|cue| (cue, 0)),
    }
}

fn keyword_cue(word: &str) -> Option<Cue> {
    match word {
        "from" => Some(Cue::From),
        "limit" => Some(Cue::Limit),
        "offset" => Some(Cue::Offset),
        "having" => Some(Cue::Having),
        "in" => Some(Cue::In),
        _ => None,
    }
}

fn cycle_value(cue: Cue, position: usize, settings: &TextSettings) -> Value {
    match cue {
        Cue::From => Value::Str(settings.table.clone()),
        Cue::OrderBy => pick(&settings.order_by, position)
            .map(|s| Value::Str(s.clone()))
            .unwrap_or(Value::Null),
        Cue::Limit => pick(&settings.limit, position).map_or(Value::Null, |n| Value::Int(*n)),
        Cue::Offset => pick(&settings.offset, position).map_or(Value::Null, |n| Value::Int(*n)),
        Cue::Having => Value::Str(settings.having.clone()),
        Cue::In => Value::Int(settings.in_value),
    }
}

fn last_value(cue: Cue, settings: &TextSettings) -> Value {
    let len = match cue {
        Cue::OrderBy => settings.order_by.len(),
        Cue::Limit => settings.limit.len(),
        Cue::Offset => settings.offset.len(),
        Cue::From | Cue::Having | Cue::In => 1,
    };
    cycle_value(cue, len.saturating_sub(1), settings)
}

fn pick<T>(cycle: &[T], position: usize) -> Option<&T> {
    if cycle.is_empty() {
        None
    } else {
        cycle.get(position % cycle.len())
    }
}
