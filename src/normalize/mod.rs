//! Schema normalization: raw rows -> canonical `HistoricalRecord`s.
//!
//! Input rows come from spreadsheets, CSV exports or previously stored
//! documents, so column names and value types vary. This module:
//!
//! - resolves `year`, `month`, revenue, rate, occupancy and rooms-sold columns
//!   through the configured aliases (case-insensitive)
//! - coerces every value leniently; unparseable values become missing, not zero
//! - derives `averageRate = revenue / roomsSold` where the rate is missing
//! - median-fills rate and occupancy; every coerced value counts toward the
//!   median, including values on rows dropped for a bad identity or revenue
//! - drops rows whose identity (`year`, `month`) or revenue is unusable
//! - clamps occupancy to 0..=100 and sorts ascending by period
//!
//! Duplicate `(year, month)` rows are kept as separate records; resolving them
//! is a forecasting-stage decision (`DuplicatePolicy`).

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::coerce::{as_f64, as_whole_number};
use crate::domain::{HistoricalRecord, MAX_YEAR, MIN_YEAR, Period, SchemaConfig};
use crate::error::SchemaError;
use crate::io::ingest::RawRow;
use crate::math::{clamp, median};

/// Why a row was left out of the canonical output.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    MissingYear,
    MissingMonth,
    MissingRevenue,
    NegativeRevenue(f64),
    InvalidPeriod { year: i64, month: i64 },
    /// `revenue / roomsSold` is undefined for this row.
    ZeroRoomsSold,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingYear => write!(f, "missing or non-integer year"),
            DropReason::MissingMonth => write!(f, "missing or non-integer month"),
            DropReason::MissingRevenue => write!(f, "missing or non-numeric revenue"),
            DropReason::NegativeRevenue(v) => write!(f, "negative revenue {v}"),
            DropReason::InvalidPeriod { year, month } => {
                write!(f, "invalid period {year}-{month} (year {MIN_YEAR}..={MAX_YEAR}, month 1..12)")
            }
            DropReason::ZeroRoomsSold => write!(f, "rooms sold is zero; average rate undefined"),
        }
    }
}

/// A row-level drop, with the row's zero-based position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub row: usize,
    pub reason: DropReason,
}

/// How gaps in the optional metric columns were filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillStats {
    pub rate_median: Option<f64>,
    pub occupancy_median: Option<f64>,
    pub rates_derived: usize,
    pub rates_filled: usize,
    pub occupancy_filled: usize,
}

/// Normalization output: canonical records plus what happened to the rest.
#[derive(Debug, Clone)]
pub struct NormalizedData {
    pub records: Vec<HistoricalRecord>,
    pub dropped: Vec<DroppedRow>,
    pub fill: FillStats,
    pub rows_read: usize,
}

/// Resolved source column (lowercased) for each canonical field.
#[derive(Debug, Clone)]
struct ColumnMap {
    revenue: String,
    rate: Option<String>,
    occupancy: Option<String>,
    rooms_sold: Option<String>,
}

/// A row after coercion but before filling.
#[derive(Debug, Clone)]
struct PartialRow {
    period: Period,
    revenue: f64,
    rate: Option<f64>,
    occupancy: Option<f64>,
}

/// Normalize raw rows into ascending-by-period canonical records.
pub fn normalize(rows: &[RawRow], schema: &SchemaConfig) -> Result<NormalizedData, SchemaError> {
    let columns = resolve_columns(rows, schema)?;

    let mut partial = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();
    let mut fill = FillStats::default();

    let mut rate_values = Vec::with_capacity(rows.len());
    let mut occupancy_values = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let fields = lowercase_index(row);
        match coerce_row(&fields, &columns) {
            Ok((p, derived)) => {
                if derived {
                    fill.rates_derived += 1;
                }
                rate_values.extend(p.rate);
                occupancy_values.extend(p.occupancy);
                partial.push(p);
            }
            Err(reason) => {
                debug!(row = idx, %reason, "dropping input row");
                if reason != DropReason::ZeroRoomsSold {
                    let (rate, occupancy) = observed_metrics(&fields, &columns);
                    rate_values.extend(rate);
                    occupancy_values.extend(occupancy);
                }
                dropped.push(DroppedRow { row: idx, reason });
            }
        }
    }

    if partial.is_empty() {
        return Err(SchemaError::NoValidRows {
            read: rows.len(),
            dropped: dropped.len(),
        });
    }

    fill.rate_median = median(&rate_values);
    fill.occupancy_median = median(&occupancy_values);

    if fill.rate_median.is_none() {
        warn!("no usable average rate values; averageRate will be left undefined");
    }
    if fill.occupancy_median.is_none() {
        warn!("no usable occupancy values; occupancyPercent will be left undefined");
    }

    let mut records = Vec::with_capacity(partial.len());
    for p in partial {
        if p.rate.is_none() && fill.rate_median.is_some() {
            fill.rates_filled += 1;
        }
        if p.occupancy.is_none() && fill.occupancy_median.is_some() {
            fill.occupancy_filled += 1;
        }
        records.push(HistoricalRecord {
            year: p.period.year(),
            month: p.period.month(),
            period: p.period.first_day(),
            revenue: p.revenue,
            average_rate: p.rate.or(fill.rate_median),
            occupancy_percent: p
                .occupancy
                .or(fill.occupancy_median)
                .map(|v| clamp(v, 0.0, 100.0)),
        });
    }

    // Stable: duplicate periods keep their input order.
    records.sort_by_key(|r| (r.year, r.month));

    info!(
        rows_read = rows.len(),
        rows_kept = records.len(),
        rows_dropped = dropped.len(),
        rates_derived = fill.rates_derived,
        rates_filled = fill.rates_filled,
        occupancy_filled = fill.occupancy_filled,
        "normalized historical rows"
    );

    Ok(NormalizedData {
        records,
        dropped,
        fill,
        rows_read: rows.len(),
    })
}

fn resolve_columns(rows: &[RawRow], schema: &SchemaConfig) -> Result<ColumnMap, SchemaError> {
    let present: BTreeSet<String> = rows
        .iter()
        .flat_map(|row| row.keys().map(|k| k.trim().to_lowercase()))
        .collect();

    if !present.contains("year") {
        return Err(SchemaError::MissingYear);
    }
    if !present.contains("month") {
        return Err(SchemaError::MissingMonth);
    }

    let first_present = |aliases: &[String]| {
        aliases
            .iter()
            .map(|a| a.trim().to_lowercase())
            .find(|a| present.contains(a))
    };

    let revenue = first_present(&schema.revenue_aliases).ok_or_else(|| SchemaError::MissingRevenue {
        aliases: schema.revenue_aliases.clone(),
    })?;

    Ok(ColumnMap {
        revenue,
        rate: first_present(&schema.rate_aliases),
        occupancy: first_present(&schema.occupancy_aliases),
        rooms_sold: first_present(&schema.rooms_sold_aliases),
    })
}

fn lowercase_index(row: &RawRow) -> HashMap<String, &Value> {
    row.iter().map(|(k, v)| (k.trim().to_lowercase(), v)).collect()
}

fn number_in(fields: &HashMap<String, &Value>, col: Option<&String>) -> Option<f64> {
    col.and_then(|c| fields.get(c)).and_then(|v| as_f64(v))
}

/// Explicit rate and occupancy values of a row, before any derivation.
fn observed_metrics(fields: &HashMap<String, &Value>, columns: &ColumnMap) -> (Option<f64>, Option<f64>) {
    // Negative rates are as meaningless as missing ones.
    let rate = number_in(fields, columns.rate.as_ref()).filter(|v| *v >= 0.0);
    (rate, number_in(fields, columns.occupancy.as_ref()))
}

/// Coerce one row. Returns the partial row and whether its rate was derived.
fn coerce_row(fields: &HashMap<String, &Value>, columns: &ColumnMap) -> Result<(PartialRow, bool), DropReason> {

    let year = fields
        .get("year")
        .and_then(|v| as_whole_number(v))
        .ok_or(DropReason::MissingYear)?;
    let month = fields
        .get("month")
        .and_then(|v| as_whole_number(v))
        .ok_or(DropReason::MissingMonth)?;
    let revenue = number_in(fields, Some(&columns.revenue)).ok_or(DropReason::MissingRevenue)?;

    let period = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .and_then(|(y, m)| Period::new(y, m))
        .ok_or(DropReason::InvalidPeriod { year, month })?;

    if revenue < 0.0 {
        return Err(DropReason::NegativeRevenue(revenue));
    }

    let (mut rate, occupancy) = observed_metrics(fields, columns);
    let mut derived = false;
    if rate.is_none() {
        if let Some(rooms_sold) = number_in(fields, columns.rooms_sold.as_ref()) {
            if rooms_sold == 0.0 {
                return Err(DropReason::ZeroRoomsSold);
            }
            if rooms_sold > 0.0 {
                rate = Some(revenue / rooms_sold);
                derived = true;
            }
        }
    }

    Ok((
        PartialRow {
            period,
            revenue,
            rate,
            occupancy,
        },
        derived,
    ))
}
