//! Forecast report export and historical summaries.
//!
//! - `report`: snapshot the forecast collection into a timestamped CSV/JSON file
//! - `summary`: monthly/yearly aggregates over normalized history
//! - `format`: terminal tables for every command

pub mod format;
pub mod summary;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::domain::ReportFormat;
use crate::domain::coerce::{as_f64, as_integer};
use crate::error::PipelineError;
use crate::io::export::{write_report_csv, write_report_json};
use crate::store::{Document, DocumentStore};

pub use summary::{SummaryRow, summarize};

/// File name prefix for generated reports.
pub const REPORT_PREFIX: &str = "forecast_report";

/// One exported row in the fixed column order.
///
/// `None` is the explicit no-value marker: an empty CSV cell or JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub revenue: Option<f64>,
    pub average_rate: Option<f64>,
    pub occupancy_percent: Option<f64>,
}

impl ReportRow {
    pub fn from_document(doc: &Document) -> Self {
        let int = |key: &str| doc.get(key).and_then(as_integer);
        let num = |key: &str| doc.get(key).and_then(as_f64);
        Self {
            year: int("year"),
            month: int("month"),
            revenue: num("revenue"),
            average_rate: num("averageRate"),
            occupancy_percent: num("occupancyPercent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutput {
    pub file_path: PathBuf,
    pub rows: usize,
}

/// Project documents onto the report columns, sorted by `(year, month)`.
///
/// Rows without a usable year or month sort after every keyed row.
pub fn collect_rows(docs: &[Document]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = docs.iter().map(ReportRow::from_document).collect();
    rows.sort_by_key(|r| (r.year.is_none(), r.year, r.month.is_none(), r.month));
    rows
}

/// Export `collection` to a new report file in `output_dir`.
pub fn report(
    store: &dyn DocumentStore,
    collection: &str,
    output_dir: &Path,
    format: ReportFormat,
) -> Result<ReportOutput, PipelineError> {
    report_at(store, collection, output_dir, format, Local::now().naive_local())
}

/// Same as [`report`] with an explicit generation timestamp.
pub fn report_at(
    store: &dyn DocumentStore,
    collection: &str,
    output_dir: &Path,
    format: ReportFormat,
    generated_at: NaiveDateTime,
) -> Result<ReportOutput, PipelineError> {
    let docs: Vec<Document> = store.find_all(collection)?.into_iter().map(|d| d.fields).collect();
    if docs.is_empty() {
        return Err(PipelineError::EmptyCollection(collection.to_string()));
    }
    let rows = collect_rows(&docs);

    std::fs::create_dir_all(output_dir)?;
    let file_path = report_path(output_dir, generated_at, format);
    match format {
        ReportFormat::Csv => write_report_csv(&file_path, &rows)?,
        ReportFormat::Json => write_report_json(&file_path, &rows)?,
    }

    info!(path = %file_path.display(), rows = rows.len(), "report written");
    Ok(ReportOutput {
        file_path,
        rows: rows.len(),
    })
}

/// Pick a report file name that does not collide with an existing file.
pub fn report_path(dir: &Path, generated_at: NaiveDateTime, format: ReportFormat) -> PathBuf {
    let stem = format!("{REPORT_PREFIX}_{}", generated_at.format("%Y%m%d_%H%M%S"));
    let ext = format.extension();
    let first = dir.join(format!("{stem}.{ext}"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
    }

    #[test]
    fn rows_sort_by_period_with_unkeyed_rows_last() {
        let docs = vec![
            doc(json!({"year": 2024, "month": 2, "revenue": 2.0})),
            doc(json!({"revenue": 9.0})),
            doc(json!({"year": "2023", "month": 12.0, "revenue": 1.0})),
            doc(json!({"year": 2024, "month": 1})),
        ];
        let rows = collect_rows(&docs);
        let keys: Vec<_> = rows.iter().map(|r| (r.year, r.month)).collect();
        assert_eq!(
            keys,
            vec![(Some(2023), Some(12)), (Some(2024), Some(1)), (Some(2024), Some(2)), (None, None)]
        );
        assert_eq!(rows[1].revenue, None);
        assert_eq!(rows[1].occupancy_percent, None);
    }

    #[test]
    fn empty_collection_is_an_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let err = report(&store, "predicted_data", dir.path(), ReportFormat::Csv).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCollection(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn csv_report_has_fixed_columns_and_empty_markers() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store
            .insert_many(
                "p",
                vec![
                    doc(json!({"year": 2024, "month": 2, "revenue": 20.5})),
                    doc(json!({"year": 2024, "month": 1, "revenue": 10.0, "averageRate": 99.5, "occupancyPercent": 70.0})),
                ],
            )
            .unwrap();

        let out = report_at(&store, "p", dir.path(), ReportFormat::Csv, stamp()).unwrap();
        assert_eq!(out.rows, 2);
        assert_eq!(
            out.file_path.file_name().unwrap().to_str().unwrap(),
            "forecast_report_20240506_070809.csv"
        );
        let text = std::fs::read_to_string(&out.file_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "year,month,revenue,averageRate,occupancyPercent");
        assert_eq!(lines[1], "2024,1,10.0,99.5,70.0");
        assert_eq!(lines[2], "2024,2,20.5,,");
    }

    #[test]
    fn json_report_uses_null_and_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store
            .insert_many("p", vec![doc(json!({"year": 2024, "month": 1, "revenue": 1.0}))])
            .unwrap();

        let first = report_at(&store, "p", dir.path(), ReportFormat::Json, stamp()).unwrap();
        let second = report_at(&store, "p", dir.path(), ReportFormat::Json, stamp()).unwrap();
        assert_ne!(first.file_path, second.file_path);
        assert!(second.file_path.to_string_lossy().ends_with("_1.json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&first.file_path).unwrap()).unwrap();
        assert_eq!(parsed[0]["averageRate"], serde_json::Value::Null);
        assert_eq!(parsed[0]["year"], json!(2024));
    }
}
