//! Monthly / yearly aggregates over normalized history.
//!
//! Revenue is summed. Average rate and occupancy are averaged over the rows
//! that carry them, so a period with no rate data reports none rather than 0.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Granularity, HistoricalRecord};
use crate::math::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub year: i32,
    /// `None` for yearly rows.
    pub month: Option<u32>,
    pub revenue: f64,
    pub average_rate: Option<f64>,
    pub occupancy_percent: Option<f64>,
    /// Number of historical rows folded into this one.
    pub rows: usize,
}

#[derive(Default)]
struct Acc {
    revenue: f64,
    rates: Vec<f64>,
    occupancy: Vec<f64>,
    rows: usize,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| round_to(values.iter().sum::<f64>() / values.len() as f64, 2))
}

pub fn summarize(records: &[HistoricalRecord], granularity: Granularity) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(i32, Option<u32>), Acc> = BTreeMap::new();
    for r in records {
        let month = match granularity {
            Granularity::Monthly => Some(r.month),
            Granularity::Yearly => None,
        };
        let acc = groups.entry((r.year, month)).or_default();
        acc.revenue += r.revenue;
        acc.rates.extend(r.average_rate);
        acc.occupancy.extend(r.occupancy_percent);
        acc.rows += 1;
    }

    groups
        .into_iter()
        .map(|((year, month), acc)| SummaryRow {
            year,
            month,
            revenue: round_to(acc.revenue, 2),
            average_rate: mean(&acc.rates),
            occupancy_percent: mean(&acc.occupancy),
            rows: acc.rows,
        })
        .collect()
}
