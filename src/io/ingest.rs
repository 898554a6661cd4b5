//! Raw row loading from CSV or JSON files.
//!
//! This module only turns a file into a list of loosely-typed rows
//! (`field name -> value`). All schema decisions live in `normalize`.
//!
//! - `.json` files must contain a top-level array of objects.
//! - anything else is read as CSV with a header row; every cell becomes a
//!   string (empty cells become `null`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::PipelineError;

/// One input row before normalization.
pub type RawRow = Map<String, Value>;

/// Load raw rows from `path`, choosing the parser by file extension.
pub fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>, PipelineError> {
    let file = File::open(path).map_err(|e| {
        PipelineError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open input '{}': {e}", path.display()),
        ))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let rows = if is_json {
        read_json_rows(file)?
    } else {
        read_csv_rows(file)?
    };
    debug!(path = %path.display(), rows = rows.len(), "loaded raw rows");
    Ok(rows)
}

/// Parse CSV with a header row into raw rows.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (name, cell) in headers.iter().zip(record.iter()) {
            if name.is_empty() {
                continue;
            }
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parse a JSON array of objects into raw rows.
pub fn read_json_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, PipelineError> {
    let values: Vec<Value> = serde_json::from_reader(reader)?;
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match value {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (clean_header(&k), v))
                .collect()),
            other => Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("input row {idx} is not a JSON object: {other}"),
            ))),
        })
        .collect()
}

fn clean_header(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM; left
    // in place it would make `year` look like a different column.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}
