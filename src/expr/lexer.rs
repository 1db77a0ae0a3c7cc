//! Lexer for test expressions.
//!
//! Converts guard text such as `status != null and list.size() > 0` into a
//! sequence of tokens with span information. Word operators (`and`, `neq`,
//! `gte`, ...) lex to the same tokens as their symbolic spellings.

use chumsky::prelude::*;

/// A token in a test expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // ========================================================================
    // Literals and names
    // ========================================================================
    Ident(&'src str),
    /// Quoted text without its quotes. Either quote style is accepted.
    Str(&'src str),
    /// Digits with an optional fraction and an optional `l`/`d`/`f` suffix.
    Number(&'src str),
    Null,
    True,
    False,

    // ========================================================================
    // Logical operators
    // ========================================================================
    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
    /// `!` or `not`
    Not,

    // ========================================================================
    // Comparison operators
    // ========================================================================
    /// `==` or `eq`
    EqEq,
    /// `!=` or `neq`
    NotEq,
    /// `<` or `lt`
    Lt,
    /// `<=` or `lte`
    LtEq,
    /// `>` or `gt`
    Gt,
    /// `>=` or `gte`
    GtEq,

    // ========================================================================
    // Punctuation
    // ========================================================================
    Minus,
    Dot,
    Comma,
    LParen,
    RParen,
}

impl<'src> std::fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{name}"),
            Token::Str(text) => write!(f, "'{text}'"),
            Token::Number(text) => write!(f, "{text}"),
            Token::Null => write!(f, "null"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Minus => write!(f, "-"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Map an identifier string to a keyword token or return Ident.
fn keyword_or_ident(s: &str) -> Token<'_> {
    match s {
        "null" => Token::Null,
        "true" => Token::True,
        "false" => Token::False,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "eq" => Token::EqEq,
        "neq" => Token::NotEq,
        "lt" => Token::Lt,
        "lte" => Token::LtEq,
        "gt" => Token::Gt,
        "gte" => Token::GtEq,
        _ => Token::Ident(s),
    }
}

/// Create a lexer for test expressions.
///
/// Returns a parser that tokenizes the input string into a sequence of
/// tokens with span information, skipping whitespace.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let ident = text::ident().map(keyword_or_ident);

    let double_quoted = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::Str);

    let single_quoted = just('\'')
        .ignore_then(none_of('\'').repeated().to_slice())
        .then_ignore(just('\''))
        .map(Token::Str);

    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .then(one_of("lLdDfF").or_not())
        .to_slice()
        .map(Token::Number);

    // Multi-char operators first
    let symbol = choice((
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("<=").to(Token::LtEq),
        just(">=").to(Token::GtEq),
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('!').to(Token::Not),
        just('-').to(Token::Minus),
        just('.').to(Token::Dot),
        just(',').to(Token::Comma),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
    ));

    let token = choice((ident, double_quoted, single_quoted, number, symbol))
        .map_with(|tok, e| (tok, e.span()));

    token
        .padded()
        .repeated()
        .collect()
        .padded()
        .then_ignore(end())
}

/// Lex a source string into tokens.
///
/// Returns Ok with the token list on success, or Err with the lex errors.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, SimpleSpan)>, Vec<Rich<'_, char>>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(tokens.unwrap_or_default())
    } else {
        Err(errs)
    }
}
