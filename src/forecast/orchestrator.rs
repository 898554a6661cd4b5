//! Multi-metric forecast orchestration.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! history -> per-metric series -> parallel forecasts -> join by period -> records
//!
//! The three metric forecasts share no data, so they run in parallel (rayon),
//! but the join is keyed by period and checked: every metric must produce the
//! same future periods, otherwise the run fails rather than merging a partial
//! forecast.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{DuplicatePolicy, ForecastConfig, ForecastRecord, HistoricalRecord, Metric, Period, Series};
use crate::error::PipelineError;
use crate::forecast::MetricForecaster;
use crate::math::{clamp, round_to};
use crate::models::{ForecastModel, build_model};

/// Decimal places applied to every forecast value before persistence.
pub const FORECAST_DECIMALS: u32 = 2;

/// Outputs of one forecast run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// One record per future period, ascending.
    pub records: Vec<ForecastRecord>,
    /// Metrics with no history at all, left undefined on every record.
    pub skipped: Vec<Metric>,
    pub model: &'static str,
    pub history_points: usize,
}

/// Forecast every tracked metric with the configured model.
pub fn forecast(history: &[HistoricalRecord], config: &ForecastConfig) -> Result<ForecastRun, PipelineError> {
    let model = build_model(config);
    forecast_with_model(history, config, model.as_ref())
}

/// Forecast every tracked metric with an explicit model.
pub fn forecast_with_model(
    history: &[HistoricalRecord],
    config: &ForecastConfig,
    model: &dyn ForecastModel,
) -> Result<ForecastRun, PipelineError> {
    let horizon = config.horizon;
    if horizon == 0 {
        return Err(PipelineError::InvalidHorizon("horizon must be at least 1 month".to_string()));
    }

    let mut series = Vec::with_capacity(Metric::ALL.len());
    let mut skipped = Vec::new();
    for metric in Metric::ALL {
        let s = build_series(history, metric, config.duplicate_policy);
        // Revenue is the ground-truth metric; the others may be absent entirely.
        if s.is_empty() && metric != Metric::Revenue {
            warn!(%metric, "no history for metric; skipping its forecast");
            skipped.push(metric);
            continue;
        }
        series.push(s);
    }

    let outputs: Vec<(Metric, Vec<(Period, f64)>)> = series
        .par_iter()
        .map(|s| {
            let log_transform = s.metric == Metric::Revenue && config.log_transform_revenue;
            MetricForecaster::new(model, log_transform)
                .forecast(s, horizon)
                .map(|points| (s.metric, points))
        })
        .collect::<Result<_, _>>()?;

    let records = join_by_period(&outputs)?;

    info!(
        model = model.name(),
        history = history.len(),
        horizon,
        records = records.len(),
        skipped = skipped.len(),
        "forecast complete"
    );

    Ok(ForecastRun {
        records,
        skipped,
        model: model.name(),
        history_points: history.len(),
    })
}

/// Build the input series for `metric`, resolving duplicate periods per `policy`.
pub fn build_series(history: &[HistoricalRecord], metric: Metric, policy: DuplicatePolicy) -> Series {
    let mut raw: Vec<(Period, f64)> = history
        .iter()
        .filter_map(|r| r.value(metric).map(|v| (r.key(), v)))
        .collect();
    // Stable sort: rows sharing a period keep input order for first/last.
    raw.sort_by_key(|(p, _)| *p);

    let points = match policy {
        DuplicatePolicy::KeepAll => raw,
        DuplicatePolicy::KeepFirst => raw.chunk_by(|a, b| a.0 == b.0).map(|g| g[0]).collect(),
        DuplicatePolicy::KeepLast => raw
            .chunk_by(|a, b| a.0 == b.0)
            .map(|g| g[g.len() - 1])
            .collect(),
        DuplicatePolicy::AggregateMean => raw
            .chunk_by(|a, b| a.0 == b.0)
            .map(|g| (g[0].0, g.iter().map(|(_, v)| v).sum::<f64>() / g.len() as f64))
            .collect(),
    };

    Series { metric, points }
}

fn join_by_period(outputs: &[(Metric, Vec<(Period, f64)>)]) -> Result<Vec<ForecastRecord>, PipelineError> {
    let Some((_, base)) = outputs.iter().find(|(m, _)| *m == Metric::Revenue) else {
        return Err(PipelineError::InconsistentForecast(
            "revenue forecast missing from join".to_string(),
        ));
    };
    let periods: Vec<Period> = base.iter().map(|(p, _)| *p).collect();

    for (metric, points) in outputs {
        let theirs: Vec<Period> = points.iter().map(|(p, _)| *p).collect();
        if theirs != periods {
            return Err(PipelineError::InconsistentForecast(format!(
                "{metric} produced periods {} but revenue produced {}",
                describe(&theirs),
                describe(&periods)
            )));
        }
    }

    let value_at = |metric: Metric, idx: usize| {
        outputs
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, points)| points[idx].1)
    };

    Ok(periods
        .iter()
        .enumerate()
        .map(|(idx, period)| ForecastRecord {
            year: period.year(),
            month: period.month(),
            revenue: round_to(base[idx].1, FORECAST_DECIMALS),
            average_rate: value_at(Metric::AverageRate, idx).map(|v| round_to(v, FORECAST_DECIMALS)),
            occupancy_percent: value_at(Metric::Occupancy, idx)
                .map(|v| round_to(clamp(v, 0.0, 100.0), FORECAST_DECIMALS)),
        })
        .collect())
}

fn describe(periods: &[Period]) -> String {
    match (periods.first(), periods.last()) {
        (Some(first), Some(last)) => format!("{first}..{last} ({} months)", periods.len()),
        _ => "nothing".to_string(),
    }
}
