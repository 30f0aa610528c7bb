use super::{Outcome, RecordSink};
use crate::records::Record;
use anyhow::Result;
use std::io::{BufWriter, Write};

/// Writes the original object of every matching record, one per line.
pub struct JsonlSink {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl JsonlSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl RecordSink for JsonlSink {
    fn add_record(&mut self, record: &Record, outcome: &Outcome) -> Result<()> {
        if !matches!(outcome, Ok(eval) if eval.verdict) {
            return Ok(());
        }
        serde_json::to_writer(&mut self.writer, &record.raw)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
