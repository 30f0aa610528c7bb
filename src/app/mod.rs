use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use simplequery::query::Query;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::config::{FiltersConfig, RuntimeConfig};
use crate::records::{Record, read_records};
use crate::sinks::{ExplainSink, JsonlSink, Outcome, RecordSink, open_output};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Query expression, e.g. "status=active AND (age>=18 OR vip)"
    #[arg(short, long, conflicts_with = "name")]
    pub query: Option<String>,

    /// Filter configuration file (YAML) with named queries
    #[arg(short, long)]
    pub filters: Option<PathBuf>,

    /// Name of the query to use from the filter configuration
    #[arg(short, long, requires = "filters")]
    pub name: Option<String>,

    /// Input file, one JSON object per line ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Output file ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// Abort on the first record that fails to evaluate
    #[arg(long)]
    pub strict: bool,

    /// Maximum bracket nesting depth
    #[arg(long, env = "SIMPLEQUERY_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    /// Matching records as JSON Lines
    #[value(name = "jsonl")]
    Jsonl,
    /// Every record with its verdict and clause trace
    #[value(name = "explain")]
    Explain,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::Jsonl => "jsonl",
        OutputFormat::Explain => "explain",
    }
}

/// Resolve the query text and runtime settings from the command line and
/// the optional filter file. CLI values win over the file.
pub fn resolve_query(cli: &Cli) -> Result<(String, RuntimeConfig)> {
    let filters = cli.filters.as_deref().map(FiltersConfig::load).transpose()?;

    let text = match (&cli.query, &cli.name, &filters) {
        (Some(query), _, _) => query.clone(),
        (None, Some(name), Some(filters)) => filters.query(name)?.to_string(),
        _ => bail!("CLI: Provide --query, or --filters with --name"),
    };

    let mut runtime = RuntimeConfig {
        strict: cli.strict,
        ..RuntimeConfig::default()
    };
    if let Some(depth) = cli
        .max_depth
        .or_else(|| filters.as_ref().and_then(|f| f.max_depth))
    {
        runtime.max_depth = depth;
    }

    Ok((text, runtime))
}

pub fn init_sink(format: &OutputFormat, output: &Path) -> Result<Box<dyn RecordSink>> {
    let writer = open_output(output)
        .with_context(|| format!("Output: Failed to open {:?}", output))?;
    tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
    Ok(match format {
        OutputFormat::Jsonl => Box::new(JsonlSink::new(writer)),
        OutputFormat::Explain => Box::new(ExplainSink::new(writer)),
    })
}

pub fn load_records(input: &Path) -> Result<Vec<Record>> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file =
            File::open(input).with_context(|| format!("Input: Failed to open {:?}", input))?;
        Box::new(BufReader::new(file))
    };
    read_records(reader)
}

/// Counts reported after a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub records: usize,
    pub matched: usize,
    pub failed: usize,
}

/// Evaluate every record in parallel and feed the outcomes to `sink` in
/// input order.
pub fn filter_records(
    query: &Query,
    records: &[Record],
    runtime: &RuntimeConfig,
    sink: &mut dyn RecordSink,
) -> Result<Summary> {
    let outcomes: Vec<Outcome> = records
        .par_iter()
        .map(|record| query.evaluate(&record.facts))
        .collect();

    let mut summary = Summary {
        records: records.len(),
        ..Summary::default()
    };

    for (record, outcome) in records.iter().zip(&outcomes) {
        match outcome {
            Ok(eval) if eval.verdict => summary.matched += 1,
            Ok(_) => {}
            Err(e) => {
                if runtime.strict {
                    bail!("Pipeline: Record on line {} failed: {}", record.line, e);
                }
                tracing::debug!("Record on line {} failed: {}", record.line, e);
                summary.failed += 1;
            }
        }
        sink.add_record(record, outcome)?;
    }

    if summary.failed > 0 {
        tracing::warn!(
            "{} of {} records could not be evaluated and were skipped",
            summary.failed,
            summary.records
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplequery::query::EvalOptions;

    struct CollectSink {
        lines: Vec<(usize, bool)>,
    }

    impl RecordSink for CollectSink {
        fn add_record(&mut self, record: &Record, outcome: &Outcome) -> Result<()> {
            let verdict = matches!(outcome, Ok(eval) if eval.verdict);
            self.lines.push((record.line, verdict));
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn records(input: &str) -> Vec<Record> {
        read_records(input.as_bytes()).unwrap()
    }

    #[test]
    fn filters_in_input_order() {
        let input: String = (0..200)
            .map(|i| format!("{{\"n\": {}}}\n", i))
            .collect();
        let records = records(&input);
        let query = Query::new("n>=150", EvalOptions::default()).unwrap();
        let mut sink = CollectSink { lines: Vec::new() };

        let summary =
            filter_records(&query, &records, &RuntimeConfig::default(), &mut sink).unwrap();

        assert_eq!(summary.records, 200);
        assert_eq!(summary.matched, 50);
        assert_eq!(summary.failed, 0);
        let lines: Vec<usize> = sink.lines.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, (1..=200).collect::<Vec<_>>());
    }

    #[test]
    fn failures_are_skipped_unless_strict() {
        let records = records("{\"n\": \"x\"}\n{\"n\": 5}\n");
        let query = Query::new("n>1", EvalOptions::default()).unwrap();

        let mut sink = CollectSink { lines: Vec::new() };
        let summary =
            filter_records(&query, &records, &RuntimeConfig::default(), &mut sink).unwrap();
        assert_eq!(
            summary,
            Summary {
                records: 2,
                matched: 1,
                failed: 1
            }
        );
        assert_eq!(sink.lines, vec![(1, false), (2, true)]);

        let strict = RuntimeConfig {
            strict: true,
            ..RuntimeConfig::default()
        };
        let mut sink = CollectSink { lines: Vec::new() };
        let err = filter_records(&query, &records, &strict, &mut sink).unwrap_err();
        assert!(err.to_string().contains("line 1"), "{}", err);
    }

    #[test]
    fn query_flag_wins_over_filters() {
        let cli = Cli::parse_from(["simplequery", "--query", "a AND b", "--max-depth", "3"]);
        let (text, runtime) = resolve_query(&cli).unwrap();
        assert_eq!(text, "a AND b");
        assert_eq!(runtime.max_depth, 3);
    }

    #[test]
    fn missing_query_is_an_error() {
        let cli = Cli::parse_from(["simplequery"]);
        assert!(resolve_query(&cli).is_err());
    }
}
