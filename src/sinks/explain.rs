use super::{Outcome, RecordSink};
use crate::records::Record;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{BufWriter, Write};

#[derive(Serialize)]
struct ExplainRow<'a> {
    line: usize,
    verdict: bool,
    trace: &'a [bool],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    record: &'a Map<String, Value>,
}

/// Writes every record with its verdict and clause trace.
pub struct ExplainSink {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl ExplainSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl RecordSink for ExplainSink {
    fn add_record(&mut self, record: &Record, outcome: &Outcome) -> Result<()> {
        let row = match outcome {
            Ok(eval) => ExplainRow {
                line: record.line,
                verdict: eval.verdict,
                trace: &eval.trace,
                error: None,
                record: &record.raw,
            },
            Err(err) => ExplainRow {
                line: record.line,
                verdict: false,
                trace: &[],
                error: Some(err.to_string()),
                record: &record.raw,
            },
        };
        serde_json::to_writer(&mut self.writer, &row)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
