//! SQL text utilities: comment stripping and statement splitting over the
//! `sqlparser` tokenizer, plus table-name extraction that does not need a
//! full parse.

use sqlparser::dialect::SnowflakeDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use tracing::debug;

/// Tokenize with quoted text kept verbatim. `//` line comments are only
/// recognised by the Snowflake tokenizer.
fn tokenize(sql: &str) -> Option<Vec<Token>> {
    match Tokenizer::new(&SnowflakeDialect {}, sql)
        .with_unescape(false)
        .tokenize()
    {
        Ok(tokens) => Some(tokens),
        Err(err) => {
            debug!(%err, "cannot tokenize SQL");
            None
        }
    }
}

/// Print tokens back to text with comments blanked and whitespace collapsed.
fn normalize(tokens: &[Token]) -> String {
    let text: String = tokens
        .iter()
        .map(|token| match token {
            Token::Whitespace(Whitespace::SingleLineComment { .. })
            | Token::Whitespace(Whitespace::MultiLineComment(_)) => " ".to_string(),
            other => other.to_string(),
        })
        .collect();
    collapse_whitespace(&text)
}

/// Remove `--`, `//` and `/* */` comments and collapse whitespace runs.
///
/// Quoted text is copied through untouched. Text the tokenizer rejects only
/// has its whitespace collapsed.
pub fn strip_comments(sql: &str) -> String {
    match tokenize(sql) {
        Some(tokens) => normalize(&tokens),
        None => collapse_whitespace(sql),
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a script into statements at `;` outside quotes and comments.
///
/// Each statement is normalized as by [`strip_comments`]; empty statements
/// are dropped and the terminating `;` is not kept.
pub fn split_statements(script: &str) -> Vec<String> {
    let Some(tokens) = tokenize(script) else {
        return script
            .split(';')
            .map(collapse_whitespace)
            .filter(|statement| !statement.is_empty())
            .collect();
    };
    tokens
        .split(|token| *token == Token::SemiColon)
        .map(normalize)
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// Table named by an `INSERT INTO <table> (...)` statement.
///
/// Takes the third whitespace token, drops a trailing `;` and anything from
/// `(` onward, and removes backticks.
pub fn insert_table(sql: &str) -> Option<String> {
    let token = sql.split_whitespace().nth(2)?;
    let token = token.strip_suffix(';').unwrap_or(token);
    let token = token.split('(').next().unwrap_or_default();
    let name = unquote(token);
    (!name.is_empty()).then_some(name)
}

/// Remove backticks and double quotes around an identifier.
pub fn unquote(name: &str) -> String {
    name.chars().filter(|c| *c != '`' && *c != '"').collect()
}
