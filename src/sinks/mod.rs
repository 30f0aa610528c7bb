use anyhow::Result;
use simplequery::query::{Evaluation, QueryError};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::records::Record;

pub mod explain;
pub mod jsonl;

pub use self::explain::ExplainSink;
pub use self::jsonl::JsonlSink;

/// Evaluation outcome of one record.
pub type Outcome = Result<Evaluation, QueryError>;

pub trait RecordSink: Send {
    fn add_record(&mut self, record: &Record, outcome: &Outcome) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Open `path` for writing; `-` is stdout.
pub fn open_output(path: &Path) -> Result<Box<dyn Write + Send>> {
    if path == Path::new("-") {
        Ok(Box::new(std::io::stdout()))
    } else {
        Ok(Box::new(File::create(path)?))
    }
}
