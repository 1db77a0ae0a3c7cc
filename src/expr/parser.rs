//! Parser for test expressions using chumsky.
//!
//! Precedence, loosest first: `||`, `&&`, equality, relational, unary
//! (`!`, `-`), then dotted access. `&&` and `||` chains are flattened into a
//! single n-ary [`Expr::Logical`].

use std::ops::Range;

use chumsky::error::RichReason;
use chumsky::input::ValueInput;
use chumsky::prelude::*;
use thiserror::Error;

use super::lexer::{lex, Token};
use super::{CompareOp, Expr, Literal, LogicalOp, SIZE};

/// Errors produced while parsing a test expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid input at {span:?}: {message}")]
    Lex { message: String, span: Range<usize> },

    #[error("unexpected '{found}' at {span:?}: {message}")]
    UnexpectedToken {
        found: String,
        message: String,
        span: Range<usize>,
    },

    #[error("unexpected end of expression: {message}")]
    UnexpectedEnd { message: String },

    #[error("{message} at {span:?}")]
    Invalid { message: String, span: Range<usize> },

    #[error("empty expression")]
    Empty,
}

pub type ParseResult<T> = Result<T, ParseError>;

enum Prefix {
    Not,
    Negate,
}

/// Create the test expression parser.
///
/// Generic over any `ValueInput` producing `Token` values with `SimpleSpan`
/// spans. Trailing input is not rejected; [`parse`] adds `end()`.
pub fn parser<'tokens, 'src: 'tokens, I>(
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    recursive(|expr| {
        let ident = select! {
            Token::Ident(name) => name.to_string(),
        }
        .labelled("identifier");

        let literal = select! {
            Token::Null => Literal::Null,
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Str(text) => Literal::Str(text.to_string()),
        }
        .labelled("literal");

        let number = select! {
            Token::Number(text) => text,
        }
        .try_map(|text, span| {
            number_literal(text)
                .ok_or_else(|| Rich::custom(span, format!("invalid number literal '{text}'")))
        })
        .labelled("number");

        // Arguments are parsed for validity and dropped
        let arguments = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let segment = ident.then(arguments.or_not()).map(|(name, call)| match call {
            Some(_) => Expr::Method(name),
            None => Expr::Property(name),
        });

        // `a`, `a.b.c`, `a.isEmpty()`, `a.b.size()`
        let path = segment
            .clone()
            .then(
                just(Token::Dot)
                    .ignore_then(segment)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| fold_path(first, rest));

        let atom = choice((
            number.map(Expr::Const),
            literal.map(Expr::Const),
            path,
            expr.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .labelled("operand");

        let prefix = select! {
            Token::Not => Prefix::Not,
            Token::Minus => Prefix::Negate,
        };

        let unary = prefix
            .repeated()
            .collect::<Vec<_>>()
            .then(atom)
            .map(|(prefixes, inner)| {
                prefixes
                    .into_iter()
                    .rev()
                    .fold(inner, |operand, prefix| match prefix {
                        Prefix::Not => Expr::Not(Box::new(operand)),
                        Prefix::Negate => Expr::Negate(Box::new(operand)),
                    })
            });

        let relational_op = select! {
            Token::Lt => CompareOp::Lt,
            Token::LtEq => CompareOp::LtEq,
            Token::Gt => CompareOp::Gt,
            Token::GtEq => CompareOp::GtEq,
        }
        .labelled("comparison");

        let relational = unary.clone().foldl(
            relational_op.then(unary).repeated(),
            |left, (op, right)| Expr::compare(op, left, right),
        );

        let equality_op = select! {
            Token::EqEq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
        }
        .labelled("equality");

        let equality = relational.clone().foldl(
            equality_op.then(relational).repeated(),
            |left, (op, right)| Expr::compare(op, left, right),
        );

        let and = equality
            .separated_by(just(Token::And))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|operands| logical(LogicalOp::And, operands));

        and.separated_by(just(Token::Or))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|operands| logical(LogicalOp::Or, operands))
    })
}

/// Parse a test expression.
pub fn parse(source: &str) -> ParseResult<Expr> {
    let tokens = lex(source).map_err(|errs| match errs.first() {
        Some(err) => ParseError::Lex {
            message: err.to_string(),
            span: err.span().start..err.span().end,
        },
        None => ParseError::Empty,
    })?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let len = source.len();
    let token_stream = tokens.as_slice().map(
        (len..len).into(),
        |(tok, span): &(Token<'_>, SimpleSpan)| (tok, span),
    );
    let result = parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.first() {
            Some(err) => syntax_error(err),
            None => ParseError::Empty,
        });
    result
}

fn syntax_error(err: &Rich<'_, Token<'_>, SimpleSpan>) -> ParseError {
    let span = err.span().start..err.span().end;
    if let RichReason::Custom(message) = err.reason() {
        return ParseError::Invalid {
            message: message.to_string(),
            span,
        };
    }
    match err.found() {
        Some(token) => ParseError::UnexpectedToken {
            found: token.to_string(),
            message: err.to_string(),
            span,
        },
        None => ParseError::UnexpectedEnd {
            message: err.to_string(),
        },
    }
}

/// Join dotted segments, turning a trailing `size` into [`Expr::Size`].
fn fold_path(first: Expr, rest: Vec<Expr>) -> Expr {
    let mut segments = Vec::with_capacity(rest.len() + 1);
    segments.push(first);
    segments.extend(rest);

    let ends_in_size = matches!(
        segments.last(),
        Some(Expr::Property(name) | Expr::Method(name)) if name == SIZE
    );
    if segments.len() > 1 && ends_in_size {
        segments.pop();
        return Expr::Size(Box::new(chain(segments)));
    }
    chain(segments)
}

fn chain(mut segments: Vec<Expr>) -> Expr {
    if segments.len() == 1 {
        segments.remove(0)
    } else {
        Expr::Chain(segments)
    }
}

fn logical(op: LogicalOp, mut operands: Vec<Expr>) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        Expr::Logical { op, operands }
    }
}

fn number_literal(text: &str) -> Option<Literal> {
    let digits = text.trim_end_matches(['l', 'L', 'd', 'D', 'f', 'F']);
    let floating = digits.contains('.') || text.ends_with(['d', 'D', 'f', 'F']);
    if !floating {
        if let Ok(n) = digits.parse::<i64>() {
            return Some(Literal::Int(n));
        }
    }
    digits.parse::<f64>().ok().map(Literal::Float)
}
