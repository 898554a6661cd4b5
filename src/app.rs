//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - builds the `PipelineConfig` (environment, then flags)
//! - opens the document store
//! - runs the requested stages and prints their results

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command, EvaluateArgs, ForecastArgs, IngestArgs, ReportArgs, RunArgs, SummaryArgs};
use crate::domain::PipelineConfig;
use crate::error::PipelineError;
use crate::report::format;

pub mod pipeline;

/// Entry point for the `hf` binary.
pub fn run() -> Result<(), PipelineError> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    let config = PipelineConfig::from_env()?;
    match cli.command {
        Command::Ingest(args) => handle_ingest(args, config),
        Command::Forecast(args) => handle_forecast(args, config),
        Command::Evaluate(args) => handle_evaluate(args, config),
        Command::Report(args) => handle_report(args, config),
        Command::Summary(args) => handle_summary(args, config),
        Command::Run(args) => handle_run(args, config),
    }
}

fn handle_ingest(args: IngestArgs, mut config: PipelineConfig) -> Result<(), PipelineError> {
    args.store.apply(&mut config);
    let store = crate::store::open(&config.store);

    let out = pipeline::ingest_file(&store, &config, &args.input)?;
    println!("{}", format::format_ingest(&out, &config.store.source_collection));
    Ok(())
}

fn handle_forecast(args: ForecastArgs, mut config: PipelineConfig) -> Result<(), PipelineError> {
    args.store.apply(&mut config);
    args.forecast.apply(&mut config);
    let store = crate::store::open(&config.store);

    let out = pipeline::forecast_from_store(&store, &config)?;
    println!("{}", format::format_forecast(&out.run, &out.reconcile));
    Ok(())
}

fn handle_evaluate(args: EvaluateArgs, mut config: PipelineConfig) -> Result<(), PipelineError> {
    args.store.apply(&mut config);
    args.bounding.apply(&mut config);
    let store = crate::store::open(&config.store);

    let report = crate::evaluate::evaluate(&store, &config.store.forecast_collection, &config.bounding)?;
    println!(
        "Bounding pass on '{}': {} seen, {} updated, {} changed",
        config.store.forecast_collection, report.seen, report.updated, report.changed
    );
    Ok(())
}

fn handle_report(args: ReportArgs, mut config: PipelineConfig) -> Result<(), PipelineError> {
    args.store.apply(&mut config);
    args.report.apply(&mut config);
    let store = crate::store::open(&config.store);

    let out = crate::report::report(
        &store,
        &config.store.forecast_collection,
        &config.report.output_dir,
        config.report.format,
    )?;
    println!("Report written: {} ({} rows)", out.file_path.display(), out.rows);
    Ok(())
}

fn handle_summary(args: SummaryArgs, mut config: PipelineConfig) -> Result<(), PipelineError> {
    args.store.apply(&mut config);

    let history = match &args.input {
        Some(path) => {
            let rows = crate::io::read_raw_rows(path)?;
            crate::normalize::normalize(&rows, &config.schema)?
        }
        None => {
            let store = crate::store::open(&config.store);
            pipeline::load_history(&store, &config)?
        }
    };
    debug!(records = history.records.len(), "summarizing history");

    let rows = crate::report::summarize(&history.records, args.granularity);
    println!("{}", format::format_summary(&rows));

    if let Some(path) = &args.export {
        crate::io::write_summary_csv(path, &rows)?;
        println!("Summary written: {}", path.display());
    }
    Ok(())
}

fn handle_run(args: RunArgs, mut config: PipelineConfig) -> Result<(), PipelineError> {
    args.store.apply(&mut config);
    args.forecast.apply(&mut config);
    args.bounding.apply(&mut config);
    args.report.apply(&mut config);
    let store = crate::store::open(&config.store);

    let summary = pipeline::run_pipeline(&store, &config, args.input.as_deref());
    println!("{}", format::format_run_summary(&summary));

    match summary.into_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
