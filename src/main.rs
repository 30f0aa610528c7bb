mod app;
mod config;
mod records;
mod sinks;

use anyhow::{Context, Result};
use clap::Parser;
use simplequery::query::Query;

use app::{Cli, filter_records, init_sink, load_records, resolve_query};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let (text, runtime) = resolve_query(&cli)?;
    // Reject a malformed query before reading any input.
    let query = Query::new(text, runtime.eval_options())
        .context("CLI: Invalid query")?;
    tracing::info!("Query: {}", query.source());

    let start = std::time::Instant::now();
    let records = load_records(&cli.input)?;
    tracing::info!("Read {} records from {:?}", records.len(), cli.input);

    let mut sink = init_sink(&cli.format, &cli.output)?;
    let summary = filter_records(&query, &records, &runtime, sink.as_mut())?;
    sink.finish().context("Output: Failed to finalize sink")?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! {} of {} records matched in {:.2}s ({} skipped)",
        summary.matched,
        summary.records,
        elapsed.as_secs_f64(),
        summary.failed
    );

    Ok(())
}
