//! JSON Lines input.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::BufRead;

/// One input object and the facts a query sees.
#[derive(Debug, Clone)]
pub struct Record {
    /// 1-based line number in the input.
    pub line: usize,
    pub facts: HashMap<String, String>,
    pub raw: Map<String, Value>,
}

/// Flatten a JSON object into string facts.
///
/// Strings are kept as-is; numbers and booleans use their JSON text. Nulls,
/// arrays and nested objects have no flat string form and are left out.
pub fn build_fact_map(object: &Map<String, Value>) -> HashMap<String, String> {
    object
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    tracing::trace!("Skipping non-scalar field '{}'", key);
                    return None;
                }
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Read every record from a JSON Lines stream. Blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Input: Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("Input: Invalid JSON on line {}", line_no))?;
        let Value::Object(raw) = value else {
            bail!("Input: Line {} is not a JSON object", line_no);
        };

        records.push(Record {
            line: line_no,
            facts: build_fact_map(&raw),
            raw,
        });
    }

    Ok(records)
}
