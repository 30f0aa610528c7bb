//! Errors raised while evaluating a query.

use std::num::ParseFloatError;

use thiserror::Error;

use super::token::{ComparisonOp, Token, TokenKind};

/// Broad classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An unrecognized character in the query text.
    Lexical,
    /// A token where the grammar does not allow one.
    Syntax,
    /// A relational comparison on a value that is not a number.
    NumericParse,
}

/// Fatal error for one evaluation. No partial verdict accompanies it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("illegal character '{text}' at position {position}")]
    Lexical { position: usize, text: String },

    #[error("unexpected {kind} '{text}' at position {position}, expected {expected}")]
    Syntax {
        kind: TokenKind,
        position: usize,
        text: String,
        expected: &'static str,
    },

    #[error("bracket nesting deeper than {limit} at position {position}")]
    NestingTooDeep { position: usize, limit: usize },

    /// `source` is `None` when the number is out of range for `f32`.
    #[error("cannot compare {key}{op}: '{input}' is not a number")]
    NumericParse {
        key: String,
        op: ComparisonOp,
        input: String,
        #[source]
        source: Option<ParseFloatError>,
    },
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Lexical { .. } => ErrorKind::Lexical,
            QueryError::Syntax { .. } | QueryError::NestingTooDeep { .. } => ErrorKind::Syntax,
            QueryError::NumericParse { .. } => ErrorKind::NumericParse,
        }
    }

    pub(crate) fn illegal(token: Token<'_>) -> Self {
        QueryError::Lexical {
            position: token.position,
            text: token.text.to_string(),
        }
    }

    pub(crate) fn unexpected(token: Token<'_>, expected: &'static str) -> Self {
        QueryError::Syntax {
            kind: token.kind,
            position: token.position,
            text: token.text.to_string(),
            expected,
        }
    }
}
