//! CSV / JSON writers.
//!
//! Everything written here is meant to open cleanly in a spreadsheet: one
//! header row, a fixed column order, and empty cells for missing values.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::HistoricalRecord;
use crate::error::PipelineError;
use crate::report::{ReportRow, SummaryRow};

/// Canonical history row as written to the processed copy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessedRow {
    year: i32,
    month: u32,
    period: String,
    revenue: f64,
    average_rate: Option<f64>,
    occupancy_percent: Option<f64>,
}

impl From<&HistoricalRecord> for ProcessedRow {
    fn from(r: &HistoricalRecord) -> Self {
        Self {
            year: r.year,
            month: r.month,
            period: r.period.format("%Y-%m-%d").to_string(),
            revenue: r.revenue,
            average_rate: r.average_rate,
            occupancy_percent: r.occupancy_percent,
        }
    }
}

/// `<dir>/<stem>_processed.csv` next to `input`.
pub fn processed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    input.with_file_name(format!("{stem}_processed.csv"))
}

/// Write normalized history to CSV.
pub fn write_processed_csv(path: &Path, records: &[HistoricalRecord]) -> Result<(), PipelineError> {
    write_csv(path, records.iter().map(ProcessedRow::from))
}

pub fn write_report_csv(path: &Path, rows: &[ReportRow]) -> Result<(), PipelineError> {
    write_csv(path, rows.iter())
}

/// Write report rows as a JSON array; missing values become `null`.
pub fn write_report_json(path: &Path, rows: &[ReportRow]) -> Result<(), PipelineError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, rows)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<(), PipelineError> {
    write_csv(path, rows.iter())
}

fn write_csv<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
