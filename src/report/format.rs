//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline stages stay clean and testable
//! - output changes are localized

use crate::app::pipeline::{IngestOutput, RunSummary, StageOutcome};
use crate::domain::ForecastRecord;
use crate::forecast::ForecastRun;
use crate::reconcile::ReconcileReport;
use crate::report::SummaryRow;

/// Ingest result: counts, fill statistics and every dropped row.
pub fn format_ingest(out: &IngestOutput, collection: &str) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Ingested {} of {} rows into '{collection}'\n",
        out.inserted, out.rows_read
    ));
    s.push_str(&format!("Processed copy: {}\n", out.processed_path.display()));

    let fill = &out.fill;
    if fill.rates_derived + fill.rates_filled + fill.occupancy_filled > 0 {
        s.push_str(&format!(
            "Filled: rate derived={} median={} ({}) | occupancy median={} ({})\n",
            fill.rates_derived,
            fill.rates_filled,
            fmt_opt(fill.rate_median),
            fill.occupancy_filled,
            fmt_opt(fill.occupancy_median),
        ));
    }

    if !out.dropped.is_empty() {
        s.push_str(&format!("Dropped {} rows:\n", out.dropped.len()));
        for d in &out.dropped {
            s.push_str(&format!("  row {:>4}: {}\n", d.row + 1, d.reason));
        }
    }
    s
}

/// Forecast table followed by the upsert counts.
pub fn format_forecast(run: &ForecastRun, reconcile: &ReconcileReport) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Model: {} | history rows: {} | horizon: {}\n",
        run.model,
        run.history_points,
        run.records.len()
    ));
    for metric in &run.skipped {
        s.push_str(&format!("  (skipped {metric}: no history)\n"));
    }
    s.push('\n');
    s.push_str(&format_forecast_table(&run.records));
    s.push_str(&format!(
        "\nStored: {} written ({} inserted, {} replaced)\n",
        reconcile.written, reconcile.inserted, reconcile.replaced
    ));
    s
}

pub fn format_forecast_table(records: &[ForecastRecord]) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "{:<8} {:>14} {:>12} {:>10}\n",
        "period", "revenue", "avg_rate", "occ_%"
    ));
    s.push_str(&format!("{:-<8} {:-<14} {:-<12} {:-<10}\n", "", "", "", ""));
    for r in records {
        s.push_str(
            format!(
                "{:<8} {:>14.2} {:>12} {:>10}\n",
                format!("{}-{:02}", r.year, r.month),
                r.revenue,
                fmt_opt(r.average_rate),
                fmt_opt(r.occupancy_percent),
            )
            .trim_end(),
        );
        s.push('\n');
    }
    s
}

pub fn format_summary(rows: &[SummaryRow]) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "{:<8} {:>16} {:>12} {:>10} {:>6}\n",
        "period", "revenue", "avg_rate", "occ_%", "rows"
    ));
    s.push_str(&format!("{:-<8} {:-<16} {:-<12} {:-<10} {:-<6}\n", "", "", "", "", ""));
    for r in rows {
        let period = match r.month {
            Some(m) => format!("{}-{m:02}", r.year),
            None => r.year.to_string(),
        };
        s.push_str(&format!(
            "{:<8} {:>16.2} {:>12} {:>10} {:>6}\n",
            period,
            r.revenue,
            fmt_opt(r.average_rate),
            fmt_opt(r.occupancy_percent),
            r.rows
        ));
    }
    s
}

/// One status line per stage.
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut s = String::new();
    s.push_str("=== hf - pipeline run ===\n");
    for status in &summary.stages {
        let line = match &status.outcome {
            StageOutcome::Completed(detail) => format!("[ok]      {:<10} {detail}", status.stage),
            StageOutcome::Failed(err) => format!("[failed]  {:<10} {err}", status.stage),
            StageOutcome::Skipped => format!("[skipped] {}", status.stage),
        };
        s.push_str(&line);
        s.push('\n');
    }
    if let Some(run) = &summary.forecast {
        s.push('\n');
        s.push_str(&format_forecast_table(&run.records));
    }
    s
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
}
