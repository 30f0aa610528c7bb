//! Evaluate small boolean queries such as `status=active AND (age>=18 OR vip)`
//! against flat string maps, with a per-clause trace of the outcome.

pub mod query;

pub use query::{Evaluation, QueryError, evaluate};
