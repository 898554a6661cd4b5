//! Shared pipeline workflow used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! file -> normalize -> history collection -> forecast -> upsert -> bound -> report
//!
//! The CLI only decides which stages to run and how to print their results.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{HistoricalRecord, PipelineConfig};
use crate::error::PipelineError;
use crate::evaluate::{EvaluateReport, evaluate};
use crate::forecast::{ForecastRun, forecast};
use crate::io::{RawRow, processed_path, read_raw_rows, write_processed_csv};
use crate::normalize::{DroppedRow, FillStats, NormalizedData, normalize};
use crate::reconcile::{ReconcileReport, reconcile};
use crate::report::{ReportOutput, report};
use crate::store::{Document, DocumentStore, to_document};

/// Outputs of `hf ingest`.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub rows_read: usize,
    pub inserted: usize,
    pub processed_path: PathBuf,
    pub dropped: Vec<DroppedRow>,
    pub fill: FillStats,
}

/// Outputs of `hf forecast`.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub run: ForecastRun,
    pub reconcile: ReconcileReport,
}

/// Normalize `input`, write its processed copy, and append it to the source collection.
pub fn ingest_file(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
    input: &Path,
) -> Result<IngestOutput, PipelineError> {
    let rows = read_raw_rows(input)?;
    let normalized = normalize(&rows, &config.schema)?;

    let processed = processed_path(input);
    write_processed_csv(&processed, &normalized.records)?;

    let docs = normalized
        .records
        .iter()
        .map(history_document)
        .collect::<Result<Vec<_>, _>>()?;
    let ids = store.insert_many(&config.store.source_collection, docs)?;

    info!(
        input = %input.display(),
        rows = normalized.rows_read,
        inserted = ids.len(),
        processed = %processed.display(),
        "ingest complete"
    );
    Ok(IngestOutput {
        rows_read: normalized.rows_read,
        inserted: ids.len(),
        processed_path: processed,
        dropped: normalized.dropped,
        fill: normalized.fill,
    })
}

/// Read and normalize the stored history.
pub fn load_history(store: &dyn DocumentStore, config: &PipelineConfig) -> Result<NormalizedData, PipelineError> {
    let collection = &config.store.source_collection;
    let rows: Vec<RawRow> = store.find_all(collection)?.into_iter().map(|d| d.fields).collect();
    if rows.is_empty() {
        return Err(PipelineError::EmptyCollection(collection.clone()));
    }
    Ok(normalize(&rows, &config.schema)?)
}

/// Forecast from stored history and upsert into the forecast collection.
pub fn forecast_from_store(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
) -> Result<ForecastOutput, PipelineError> {
    let history = load_history(store, config)?;
    let run = forecast(&history.records, &config.forecast)?;
    let reconcile = reconcile(store, &config.store.forecast_collection, &run.records)?;
    Ok(ForecastOutput { run, reconcile })
}

fn history_document(record: &HistoricalRecord) -> Result<Document, PipelineError> {
    let mut doc = to_document(record)?;
    doc.insert(
        "period".to_string(),
        Value::String(record.period.format("%Y-%m-%d").to_string()),
    );
    Ok(doc)
}

/// A named pipeline step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Forecast,
    Reconcile,
    Evaluate,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Forecast => "forecast",
            Stage::Reconcile => "reconcile",
            Stage::Evaluate => "evaluate",
            Stage::Report => "report",
        };
        f.pad(name)
    }
}

#[derive(Debug)]
pub enum StageOutcome {
    /// Finished, with a one-line description of what it did.
    Completed(String),
    Failed(PipelineError),
    /// Not attempted because an earlier stage failed.
    Skipped,
}

#[derive(Debug)]
pub struct StageStatus {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Aggregated status of `hf run`.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub stages: Vec<StageStatus>,
    pub forecast: Option<ForecastRun>,
    pub report: Option<ReportOutput>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.stages
            .iter()
            .all(|s| matches!(s.outcome, StageOutcome::Completed(_)))
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .find(|s| matches!(s.outcome, StageOutcome::Failed(_)))
            .map(|s| s.stage)
    }

    /// Take ownership of the first failure, if any.
    pub fn into_error(self) -> Option<PipelineError> {
        self.stages.into_iter().find_map(|s| match s.outcome {
            StageOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    fn record<T>(&mut self, stage: Stage, result: Result<T, PipelineError>, describe: impl FnOnce(&T) -> String) -> Option<T> {
        match result {
            Ok(value) => {
                self.stages.push(StageStatus {
                    stage,
                    outcome: StageOutcome::Completed(describe(&value)),
                });
                Some(value)
            }
            Err(err) => {
                warn!(%stage, error = %err, "stage failed");
                self.stages.push(StageStatus {
                    stage,
                    outcome: StageOutcome::Failed(err),
                });
                None
            }
        }
    }

    fn skip(&mut self, stages: &[Stage]) {
        self.stages.extend(stages.iter().map(|&stage| StageStatus {
            stage,
            outcome: StageOutcome::Skipped,
        }));
    }
}

/// Run every stage in order, stopping at the first failure.
///
/// Never returns early with an error: the outcome of each stage, including the
/// ones skipped after a failure, is recorded in the summary.
pub fn run_pipeline(store: &dyn DocumentStore, config: &PipelineConfig, input: Option<&Path>) -> RunSummary {
    let mut summary = RunSummary::default();
    let later = [Stage::Forecast, Stage::Reconcile, Stage::Evaluate, Stage::Report];

    if let Some(path) = input {
        let ingested = summary.record(Stage::Ingest, ingest_file(store, config, path), |o| {
            format!(
                "{} rows read, {} stored, {} dropped",
                o.rows_read,
                o.inserted,
                o.dropped.len()
            )
        });
        if ingested.is_none() {
            summary.skip(&later);
            return summary;
        }
    }

    let run = load_history(store, config).and_then(|h| forecast(&h.records, &config.forecast));
    let Some(run) = summary.record(Stage::Forecast, run, |r| {
        format!("{} months with {} from {} history rows", r.records.len(), r.model, r.history_points)
    }) else {
        summary.skip(&later[1..]);
        return summary;
    };

    let reconciled = reconcile(store, &config.store.forecast_collection, &run.records);
    summary.forecast = Some(run);
    if summary
        .record(Stage::Reconcile, reconciled, |r| {
            format!("{} written ({} inserted, {} replaced)", r.written, r.inserted, r.replaced)
        })
        .is_none()
    {
        summary.skip(&later[2..]);
        return summary;
    }

    let bounded = evaluate(store, &config.store.forecast_collection, &config.bounding);
    if summary
        .record(Stage::Evaluate, bounded, |r: &EvaluateReport| {
            format!("{} seen, {} updated, {} changed", r.seen, r.updated, r.changed)
        })
        .is_none()
    {
        summary.skip(&later[3..]);
        return summary;
    }

    let exported = report(
        store,
        &config.store.forecast_collection,
        &config.report.output_dir,
        config.report.format,
    );
    summary.report = summary.record(Stage::Report, exported, |r| {
        format!("{} rows -> {}", r.rows, r.file_path.display())
    });

    info!(success = summary.is_success(), "pipeline run finished");
    summary
}
