//! Single clause evaluation against a fact base.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::error::QueryError;
use super::token::ComparisonOp;

/// Read-only key/value data a query is evaluated against.
pub trait Facts {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl<S: BuildHasher> Facts for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Facts for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// A `[!]key[op value]` clause.
///
/// Without an operator the clause tests whether `key` exists. With one, a
/// missing key never satisfies the comparison; `negated` then flips that
/// outcome like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition<'q> {
    pub key: &'q str,
    pub op: Option<ComparisonOp>,
    pub value: &'q str,
    pub negated: bool,
}

impl<'q> Condition<'q> {
    /// Existence test for `key`.
    pub fn exists(key: &'q str) -> Self {
        Condition {
            key,
            op: None,
            value: "",
            negated: false,
        }
    }

    /// Comparison `key<op>value`.
    pub fn compare(key: &'q str, op: ComparisonOp, value: &'q str) -> Self {
        Condition {
            key,
            op: Some(op),
            value,
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn evaluate<F: Facts + ?Sized>(&self, facts: &F) -> Result<bool, QueryError> {
        let raw = match (self.op, facts.lookup(self.key)) {
            (None, found) => found.is_some(),
            (Some(_), None) => false,
            (Some(op), Some(actual)) => self.apply(op, actual)?,
        };
        Ok(raw != self.negated)
    }

    fn apply(&self, op: ComparisonOp, actual: &str) -> Result<bool, QueryError> {
        match op {
            ComparisonOp::Eq => Ok(actual == self.value),
            ComparisonOp::Ne => Ok(actual != self.value),
            _ => {
                let expected = self.parse_number(op, self.value)?;
                let actual = self.parse_number(op, actual)?;
                Ok(compare(op, actual, expected))
            }
        }
    }

    fn parse_number(&self, op: ComparisonOp, input: &str) -> Result<f32, QueryError> {
        let error = |source| QueryError::NumericParse {
            key: self.key.to_string(),
            op,
            input: input.to_string(),
            source,
        };
        let number = input.parse::<f32>().map_err(|err| error(Some(err)))?;
        // Out of range for f32. Spelled out infinities are fine.
        if number.is_infinite() && !input.to_ascii_lowercase().contains("inf") {
            return Err(error(None));
        }
        Ok(number)
    }
}

/// Apply a comparison operator to two numbers.
fn compare(op: ComparisonOp, left: f32, right: f32) -> bool {
    match op {
        ComparisonOp::Eq => left == right,
        ComparisonOp::Ne => left != right,
        ComparisonOp::Lt => left < right,
        ComparisonOp::Le => left <= right,
        ComparisonOp::Gt => left > right,
        ComparisonOp::Ge => left >= right,
    }
}
