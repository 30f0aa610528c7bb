//! Boolean query language over flat string key/value data.
//!
//! Syntax:
//!   key                     - key exists
//!   !key                    - key doesn't exist
//!   key=value, key!=value   - string (in)equality
//!   key>n, key>=n, key<n, key<=n
//!                           - numeric comparison
//!   expr AND expr           - AND (keywords are case-insensitive)
//!   key key, (expr) expr    - implicit AND
//!   expr OR expr            - OR (no precedence, see `eval`)
//!   (expr)                  - grouping
//!
//! Evaluation yields the verdict plus a trace of every clause's result.

mod condition;
mod error;
mod eval;
mod lexer;
mod token;

pub use condition::{Condition, Facts};
pub use error::{ErrorKind, QueryError};
pub use eval::{
    DEFAULT_MAX_DEPTH, EvalOptions, Evaluation, Query, evaluate, evaluate_with, validate,
};
pub use lexer::{Lexer, tokenize};
pub use token::{ComparisonOp, Token, TokenKind};
