//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages in memory
//! - persisted as documents (camelCase field names are the stable wire shape)
//! - exported to CSV/JSON reports

use std::fmt;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Earliest accepted year for a historical record.
pub const MIN_YEAR: i32 = 1900;

/// Latest accepted year. Keeps every period, and any forecast horizon built
/// from it, well inside the range `NaiveDate` can represent.
pub const MAX_YEAR: i32 = 9999;

/// A calendar year-month pair.
///
/// Ordering is chronological. The normalized time key for joins and sorting is
/// the first day of the month (`first_day`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Build a period, rejecting years outside `MIN_YEAR..=MAX_YEAR` and months
    /// outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// First day of the month. Periods pushed past the calendar by
    /// `plus_months` saturate at `NaiveDate::MAX` so ordering is preserved.
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MAX)
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// Months elapsed since January of year 0. Consecutive months differ by 1.
    pub fn index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month - 1)
    }

    /// The calendar month immediately after this one.
    pub fn succ(self) -> Self {
        self.plus_months(1)
    }

    /// Shift forward by `months`, saturating at December of `i32::MAX`.
    pub fn plus_months(self, months: u32) -> Self {
        let idx = self.index() + i64::from(months);
        match i32::try_from(idx.div_euclid(12)) {
            Ok(year) => Self {
                year,
                month: idx.rem_euclid(12) as u32 + 1,
            },
            Err(_) => Self {
                year: i32::MAX,
                month: 12,
            },
        }
    }

    /// The `count` periods immediately following this one, gap-free.
    pub fn following(self, count: usize) -> Vec<Period> {
        (1..=count).map(|h| self.plus_months(h as u32)).collect()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A tracked performance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Revenue,
    AverageRate,
    Occupancy,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Revenue, Metric::AverageRate, Metric::Occupancy];

    /// Persisted field name.
    pub fn field_name(self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::AverageRate => "averageRate",
            Metric::Occupancy => "occupancyPercent",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// One canonical hotel-period observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRecord {
    pub year: i32,
    pub month: u32,
    /// First day of the record's month.
    #[serde(skip_serializing)]
    pub period: NaiveDate,
    pub revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rate: Option<f64>,
    /// Always within 0..=100 once produced by the normalizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_percent: Option<f64>,
}

impl HistoricalRecord {
    pub fn key(&self) -> Period {
        // `period` is derived from a validated year/month pair.
        Period::from_date(self.period).unwrap_or(Period {
            year: self.year,
            month: self.month,
        })
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Revenue => Some(self.revenue),
            Metric::AverageRate => self.average_rate,
            Metric::Occupancy => self.occupancy_percent,
        }
    }
}

/// A produced forecast for one future period, keyed by `(year, month)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_percent: Option<f64>,
}

impl ForecastRecord {
    pub fn period(&self) -> Option<Period> {
        Period::new(self.year, self.month)
    }
}

/// An ordered single-metric series used as forecaster input.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub metric: Metric,
    /// Sorted ascending by period. May contain repeated periods under
    /// `DuplicatePolicy::KeepAll`.
    pub points: Vec<(Period, f64)>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_period(&self) -> Option<Period> {
        self.points.last().map(|(p, _)| *p)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

/// How repeated `(year, month)` rows are resolved before series construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep every row as its own sample point.
    KeepAll,
    /// Keep the first row seen for a period (input order).
    KeepFirst,
    /// Keep the last row seen for a period (input order).
    KeepLast,
    /// Average the rows sharing a period.
    AggregateMean,
}

/// Which forecasting capability to plug in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModelSpec {
    /// Linear trend plus yearly Fourier seasonality (least squares).
    SeasonalTrend,
    /// Repeat the most recent 12-month cycle.
    SeasonalNaive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

/// Grouping used by the historical summary report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    Yearly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_rejects_out_of_range() {
        assert!(Period::new(1899, 12).is_none());
        assert!(Period::new(2024, 0).is_none());
        assert!(Period::new(2024, 13).is_none());
        assert!(Period::new(1900, 1).is_some());
    }

    #[test]
    fn period_rolls_over_year_end() {
        let nov = Period::new(2023, 11).unwrap();
        let next = nov.following(3);
        assert_eq!(
            next,
            vec![
                Period::new(2023, 12).unwrap(),
                Period::new(2024, 1).unwrap(),
                Period::new(2024, 2).unwrap(),
            ]
        );
        assert_eq!(nov.plus_months(14), Period::new(2025, 1).unwrap());
    }

    #[test]
    fn period_index_is_contiguous() {
        let dec = Period::new(2023, 12).unwrap();
        assert_eq!(dec.succ().index() - dec.index(), 1);
        assert_eq!(dec.first_day(), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(dec.to_string(), "2023-12");
    }

    #[test]
    fn period_rejects_years_beyond_calendar_range() {
        assert!(Period::new(MAX_YEAR, 12).is_some());
        assert!(Period::new(MAX_YEAR + 1, 1).is_none());
        assert!(Period::new(300_000, 1).is_none());

        let last = Period::new(MAX_YEAR, 12).unwrap();
        let far = last.plus_months(u32::MAX);
        assert!(far > last);
        assert!(far.first_day() >= last.first_day());
    }

    #[test]
    fn forecast_record_uses_camel_case_and_omits_missing() {
        let rec = ForecastRecord {
            year: 2024,
            month: 1,
            revenue: 1.5,
            average_rate: Some(150.0),
            occupancy_percent: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["averageRate"], 150.0);
        assert!(json.get("occupancyPercent").is_none());
    }
}
