//! Command-line parsing for the hotel forecast pipeline.
//!
//! Argument parsing stays separate from the pipeline stages: every flag here is
//! an optional override applied on top of the environment-derived
//! `PipelineConfig`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{DuplicatePolicy, Granularity, MAX_DECIMALS, ModelSpec, PipelineConfig, ReportFormat};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hf", version, about = "Hotel revenue / rate / occupancy forecast pipeline")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize a CSV/JSON file, write a processed copy, and store its rows as history.
    Ingest(IngestArgs),
    /// Forecast every metric from stored history and upsert the results.
    Forecast(ForecastArgs),
    /// Run the bounding pass over the stored forecast collection.
    Evaluate(EvaluateArgs),
    /// Export the stored forecast collection to a timestamped report file.
    Report(ReportArgs),
    /// Print monthly or yearly aggregates of the historical data.
    Summary(SummaryArgs),
    /// Run every stage in order and print one status line per stage.
    Run(RunArgs),
}

/// Store location overrides shared by every command.
#[derive(Debug, Args, Clone, Default)]
pub struct StoreArgs {
    /// Root directory of the document store (env: STORE_DIR).
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Database name under the store root (env: DB_NAME).
    #[arg(long)]
    pub db: Option<String>,
}

impl StoreArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.store_dir {
            config.store.root = dir.clone();
        }
        if let Some(db) = &self.db {
            config.store.database = db.clone();
        }
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct ForecastOptions {
    /// Months to forecast past the last observed period (env: FORECAST_HORIZON).
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Forecasting model (env: FORECAST_MODEL).
    #[arg(long, value_enum)]
    pub model: Option<ModelSpec>,

    /// How repeated (year, month) rows are resolved (env: DUPLICATE_POLICY).
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicatePolicy>,

    /// Minimum history length per metric (env: MIN_HISTORY_POINTS).
    #[arg(long)]
    pub min_points: Option<usize>,

    /// Model revenue on its natural scale instead of log space.
    #[arg(long)]
    pub no_log_revenue: bool,
}

impl ForecastOptions {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let fc = &mut config.forecast;
        if let Some(h) = self.horizon {
            fc.horizon = h;
        }
        if let Some(m) = self.model {
            fc.model = m;
        }
        if let Some(p) = self.duplicates {
            fc.duplicate_policy = p;
        }
        if self.min_points.is_some() {
            fc.min_points = self.min_points;
        }
        if self.no_log_revenue {
            fc.log_transform_revenue = false;
        }
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct BoundingOptions {
    /// Decimal places kept for averageRate; 0 stores integers (env: RATE_DECIMALS).
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_DECIMALS)))]
    pub rate_decimals: Option<u32>,
}

impl BoundingOptions {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(d) = self.rate_decimals {
            config.bounding.rate_decimals = d;
        }
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct ReportOptions {
    /// Directory for generated reports (env: REPORT_DIR).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Report file format.
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,
}

impl ReportOptions {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if let Some(f) = self.format {
            config.report.format = f;
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// CSV or JSON-array file of raw rows.
    pub input: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub forecast: ForecastOptions,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub bounding: BoundingOptions,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub report: ReportOptions,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    /// Summarize this file instead of the stored history.
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Granularity::Monthly)]
    pub granularity: Granularity,

    /// Also write the summary table to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Ingest this file before forecasting.
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub forecast: ForecastOptions,

    #[command(flatten)]
    pub bounding: BoundingOptions,

    #[command(flatten)]
    pub report: ReportOptions,
}
