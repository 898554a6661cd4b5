//! Upsert writer for forecast records.
//!
//! Each record replaces whatever document already holds its `(year, month)`
//! key, or is inserted when none does. Existing documents are matched through
//! the same lenient coercion the bounding pass uses, so a legacy document with
//! `"year": "2024"` is replaced instead of duplicated. The key is compared as
//! plain integers, so out-of-calendar keys still match themselves.
//!
//! Writes are applied one document at a time. A storage fault stops the batch
//! and is reported as `PartialWrite` with the number already applied; nothing
//! is rolled back.

use tracing::{debug, info};

use crate::domain::ForecastRecord;
use crate::domain::coerce::integer_key;
use crate::error::PipelineError;
use crate::store::{Document, DocumentStore, WriteOutcome, to_document};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub written: usize,
    pub inserted: usize,
    pub replaced: usize,
}

/// Persist `records` into `collection`, one live document per period.
pub fn reconcile(
    store: &dyn DocumentStore,
    collection: &str,
    records: &[ForecastRecord],
) -> Result<ReconcileReport, PipelineError> {
    let mut report = ReconcileReport::default();

    for record in records {
        let key = (i64::from(record.year), i64::from(record.month));
        let doc = to_document(record)?;
        let matches = |existing: &Document| integer_key(existing) == Some(key);

        let outcome = store
            .upsert(collection, &matches, doc)
            .map_err(|source| PipelineError::PartialWrite {
                written: report.written,
                total: records.len(),
                source,
            })?;

        match outcome {
            WriteOutcome::Inserted(id) => {
                report.inserted += 1;
                debug!(year = record.year, month = record.month, %id, "inserted forecast");
            }
            WriteOutcome::Replaced(id) => {
                report.replaced += 1;
                debug!(year = record.year, month = record.month, %id, "replaced forecast");
            }
        }
        report.written += 1;
    }

    info!(
        collection,
        written = report.written,
        inserted = report.inserted,
        replaced = report.replaced,
        "reconciled forecasts"
    );
    Ok(report)
}
