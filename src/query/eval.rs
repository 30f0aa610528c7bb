//! Streaming evaluator for the query language.
//!
//! There is no AST. Tokens are pulled from the lexer one at a time and each
//! finished clause is folded into the running verdict of its nesting level:
//!
//! clause   = "!"* ( "(" group | IDENT ( op value+ )? )?
//! value    = IDENT | NUMBER
//! group    = clause ( ( "AND" | "OR" )? clause )* ( ")" | EOF )
//! op       = "=" | "!=" | "<" | "<=" | ">" | ">="
//!
//! A bare key followed by another key, or a closed group followed by
//! anything, is joined by an implicit AND. After an operator every further
//! value replaces the previous one, so `a=b c` compares `a` with `c`. A `!`
//! only negates keys; in front of a group it has no effect. An empty clause
//! tests the empty key, and an unmatched `)` ends the query.
//!
//! AND and OR have no precedence. An OR-chain collects results until the
//! first clause that is not followed by OR; that clause closes the chain and
//! the chain's value *replaces* the verdict of the level. So `a AND b OR c`
//! is `b OR c` once `a` has been folded in, and `a OR b AND c` is
//! `(a OR b) AND c`.

use std::collections::BTreeMap;

use super::condition::{Condition, Facts};
use super::error::QueryError;
use super::lexer::Lexer;
use super::token::{ComparisonOp, Token, TokenKind};

/// Default bracket nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Deepest bracket nesting accepted before failing.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Result of a successful evaluation.
///
/// `trace` holds one entry per clause and per bracket group, in the order
/// they were finished: the entries of a group come before the group's own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub verdict: bool,
    pub trace: Vec<bool>,
}

/// Running accumulator of one nesting level.
#[derive(Debug)]
struct Fold {
    verdict: bool,
    pending_or: Option<bool>,
}

impl Fold {
    fn new() -> Self {
        Fold {
            verdict: true,
            pending_or: None,
        }
    }

    /// Fold a finished clause, given the token that ended it.
    fn combine(&mut self, result: bool, boundary: TokenKind) {
        let or = boundary == TokenKind::Or;
        match self.pending_or {
            Some(chain) if !or => {
                self.verdict = result || chain;
                self.pending_or = None;
            }
            Some(chain) => self.pending_or = Some(result || chain),
            None if or => self.pending_or = Some(result),
            None => self.verdict = self.verdict && result,
        }
    }
}

/// Clause being scanned.
#[derive(Debug, Default)]
struct Scan<'q> {
    key: Option<&'q str>,
    op: Option<ComparisonOp>,
    value: Option<&'q str>,
    negated: bool,
}

impl<'q> Scan<'q> {
    /// Whether `token` closes this clause.
    fn ends_at(&self, token: Token<'_>) -> bool {
        // A key right after a bare key: implicit AND.
        token.kind.is_terminator()
            || (token.kind == TokenKind::Ident && self.key.is_some() && self.op.is_none())
    }

    fn finish(self, boundary: Token<'_>) -> Result<Condition<'q>, QueryError> {
        if self.op.is_some() && self.value.is_none() {
            return Err(QueryError::unexpected(boundary, "a value"));
        }
        Ok(Condition {
            key: self.key.unwrap_or_default(),
            op: self.op,
            value: self.value.unwrap_or_default(),
            negated: self.negated,
        })
    }
}

struct Evaluator<'q, 'f, F: ?Sized> {
    lexer: Lexer<'q>,
    facts: &'f F,
    options: EvalOptions,
    trace: Vec<bool>,
}

impl<'q, F: Facts + ?Sized> Evaluator<'q, '_, F> {
    /// Evaluate one nesting level up to its closing bracket or end of input.
    fn level(&mut self, depth: usize) -> Result<bool, QueryError> {
        let mut fold = Fold::new();
        let mut scan = Scan::default();
        let mut group: Option<bool> = None;

        loop {
            let token = self.lexer.next_token();

            if token.kind == TokenKind::Illegal {
                return Err(QueryError::illegal(token));
            }

            if group.is_some() || scan.ends_at(token) {
                let result = match group.take() {
                    Some(result) => result,
                    None => std::mem::take(&mut scan)
                        .finish(token)?
                        .evaluate(self.facts)?,
                };
                tracing::trace!(depth, result, boundary = %token.kind, "clause finished");
                self.trace.push(result);
                fold.combine(result, token.kind);
                scan = Scan::default();

                match token.kind {
                    TokenKind::Eof => return Ok(fold.verdict),
                    TokenKind::RightParen => {
                        if depth == 0 {
                            tracing::debug!(position = token.position, "unmatched ')' ends the query");
                        }
                        return Ok(fold.verdict);
                    }
                    TokenKind::And | TokenKind::Or => continue,
                    // Implicit AND: the token opens the next clause.
                    _ => {}
                }
            }

            self.scan_token(&mut scan, &mut group, token, depth)?;
        }
    }

    fn scan_token(
        &mut self,
        scan: &mut Scan<'q>,
        group: &mut Option<bool>,
        token: Token<'q>,
        depth: usize,
    ) -> Result<(), QueryError> {
        if scan.key.is_none() {
            match token.kind {
                TokenKind::LeftParen => {
                    if depth >= self.options.max_depth {
                        return Err(QueryError::NestingTooDeep {
                            position: token.position,
                            limit: self.options.max_depth,
                        });
                    }
                    *group = Some(self.level(depth + 1)?);
                }
                TokenKind::Not => scan.negated = true,
                TokenKind::Ident => scan.key = Some(token.text),
                _ => return Err(QueryError::unexpected(token, "a key, '!' or '('")),
            }
            return Ok(());
        }

        if scan.op.is_none() {
            match token.kind.comparison() {
                Some(op) => scan.op = Some(op),
                None => return Err(QueryError::unexpected(token, "a comparison operator")),
            }
            return Ok(());
        }

        match token.kind {
            TokenKind::Ident | TokenKind::Number => {
                scan.value = Some(token.text);
                Ok(())
            }
            _ => Err(QueryError::unexpected(token, "a value")),
        }
    }
}

/// Evaluate `query` against `facts` with default options.
pub fn evaluate<F: Facts + ?Sized>(query: &str, facts: &F) -> Result<Evaluation, QueryError> {
    evaluate_with(query, facts, EvalOptions::default())
}

/// Evaluate `query` against `facts`.
///
/// An empty (or whitespace only) query matches everything and has an empty
/// trace.
pub fn evaluate_with<F: Facts + ?Sized>(
    query: &str,
    facts: &F,
    options: EvalOptions,
) -> Result<Evaluation, QueryError> {
    if query.trim().is_empty() {
        return Ok(Evaluation {
            verdict: true,
            trace: Vec::new(),
        });
    }

    let mut evaluator = Evaluator {
        lexer: Lexer::new(query),
        facts,
        options,
        trace: Vec::new(),
    };

    match evaluator.level(0) {
        Ok(verdict) => {
            tracing::debug!(query, verdict, clauses = evaluator.trace.len(), "query evaluated");
            Ok(Evaluation {
                verdict,
                trace: evaluator.trace,
            })
        }
        Err(err) => {
            tracing::debug!(query, error = %err, "query failed");
            Err(err)
        }
    }
}

/// Check `query` for lexical and syntax errors.
///
/// Runs the query against an empty fact base: every comparison then hits a
/// missing key, so numbers are never parsed and only the query itself can
/// fail.
pub fn validate(query: &str, options: EvalOptions) -> Result<(), QueryError> {
    let empty: BTreeMap<String, String> = BTreeMap::new();
    evaluate_with(query, &empty, options).map(|_| ())
}

/// A query checked once and evaluated many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    options: EvalOptions,
}

impl Query {
    pub fn new(source: impl Into<String>, options: EvalOptions) -> Result<Self, QueryError> {
        let source = source.into();
        validate(&source, options)?;
        Ok(Query { source, options })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate<F: Facts + ?Sized>(&self, facts: &F) -> Result<Evaluation, QueryError> {
        evaluate_with(&self.source, facts, self.options)
    }

    pub fn matches<F: Facts + ?Sized>(&self, facts: &F) -> Result<bool, QueryError> {
        self.evaluate(facts).map(|eval| eval.verdict)
    }
}
