//! Token types for the query language.

use std::fmt;

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Illegal,

    // Keys and values
    Ident,
    Number,

    // Comparison operators
    Equals,         // =
    Greater,        // >
    GreaterOrEqual, // >=
    Less,           // <
    LessOrEqual,    // <=
    Not,            // !
    NotEqual,       // !=

    // Punctuation
    LeftParen,  // (
    RightParen, // )

    // Boolean keywords
    And,
    Or,
}

impl TokenKind {
    /// The comparison operator this token stands for, if any.
    pub fn comparison(self) -> Option<ComparisonOp> {
        match self {
            TokenKind::Equals => Some(ComparisonOp::Eq),
            TokenKind::NotEqual => Some(ComparisonOp::Ne),
            TokenKind::Greater => Some(ComparisonOp::Gt),
            TokenKind::GreaterOrEqual => Some(ComparisonOp::Ge),
            TokenKind::Less => Some(ComparisonOp::Lt),
            TokenKind::LessOrEqual => Some(ComparisonOp::Le),
            _ => None,
        }
    }

    /// Tokens that always close the clause being scanned.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            TokenKind::Eof | TokenKind::And | TokenKind::Or | TokenKind::RightParen
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "EOF",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Ident => "IDENT",
            TokenKind::Number => "NUMBER",
            TokenKind::Equals => "=",
            TokenKind::Greater => ">",
            TokenKind::GreaterOrEqual => ">=",
            TokenKind::Less => "<",
            TokenKind::LessOrEqual => "<=",
            TokenKind::Not => "!",
            TokenKind::NotEqual => "!=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
        };
        f.write_str(name)
    }
}

/// A single token borrowed from the query text.
///
/// `position` is the byte offset just past the token's last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub position: usize,
    pub text: &'a str,
}

/// Comparison operator of a `key<op>value` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq, // =
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl ComparisonOp {
    /// Whether both sides must be parsed as numbers.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Eq => write!(f, "="),
            ComparisonOp::Ne => write!(f, "!="),
            ComparisonOp::Lt => write!(f, "<"),
            ComparisonOp::Le => write!(f, "<="),
            ComparisonOp::Gt => write!(f, ">"),
            ComparisonOp::Ge => write!(f, ">="),
        }
    }
}
