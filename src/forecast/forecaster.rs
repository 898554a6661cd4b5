//! Single-metric forecasting with an optional log-space transform.
//!
//! Given a series and a horizon, produce exactly `horizon` `(period, estimate)`
//! pairs for the calendar months immediately after the last observation.
//!
//! Revenue grows multiplicatively, so it is modelled as `ln(y)` and the
//! estimates are exponentiated back. Zero values become `ln(1) = 0` rather than
//! an undefined logarithm; negative values are rejected.

use tracing::debug;

use crate::domain::{Period, Series};
use crate::error::{ModelError, PipelineError};
use crate::models::ForecastModel;

pub struct MetricForecaster<'a> {
    model: &'a dyn ForecastModel,
    log_transform: bool,
}

impl<'a> MetricForecaster<'a> {
    pub fn new(model: &'a dyn ForecastModel, log_transform: bool) -> Self {
        Self { model, log_transform }
    }

    pub fn forecast(&self, series: &Series, horizon: usize) -> Result<Vec<(Period, f64)>, PipelineError> {
        let required = self.model.min_points();
        let last = match series.last_period() {
            Some(last) if series.len() >= required => last,
            _ => {
                return Err(PipelineError::InsufficientData {
                    metric: series.metric,
                    required,
                    actual: series.len(),
                });
            }
        };

        let model_error = |source| PipelineError::Model {
            metric: series.metric,
            source,
        };

        let points: Vec<(Period, f64)> = if self.log_transform {
            series
                .points
                .iter()
                .map(|&(period, value)| to_log_space(period, value).map(|v| (period, v)))
                .collect::<Result<_, _>>()
                .map_err(model_error)?
        } else {
            series.points.clone()
        };

        let fitted = self.model.fit(&points).map_err(model_error)?;
        let raw = fitted.predict(horizon);
        if raw.len() != horizon {
            return Err(model_error(ModelError::WrongLength {
                model: self.model.name(),
                expected: horizon,
                actual: raw.len(),
            }));
        }

        let mut estimates = Vec::with_capacity(horizon);
        for (step, (period, value)) in last.following(horizon).into_iter().zip(raw).enumerate() {
            let value = if self.log_transform { value.exp() } else { value };
            if !value.is_finite() {
                return Err(model_error(ModelError::NonFinite {
                    model: self.model.name(),
                    step,
                }));
            }
            estimates.push((period, value));
        }

        debug!(
            metric = %series.metric,
            model = self.model.name(),
            log_transform = self.log_transform,
            history = series.len(),
            horizon,
            "metric forecast complete"
        );
        Ok(estimates)
    }
}

fn to_log_space(period: Period, value: f64) -> Result<f64, ModelError> {
    if value < 0.0 {
        debug!(%period, value, "negative value in log-space series");
        return Err(ModelError::NegativeLogInput { period, value });
    }
    // A zero month has no logarithm.
    Ok(if value == 0.0 { 0.0 } else { value.ln() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metric;
    use crate::models::{FittedModel, SeasonalNaiveModel, SeasonalTrendModel};

    fn series(metric: Metric, start: Period, values: &[f64]) -> Series {
        Series {
            metric,
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (start.plus_months(i as u32), *v))
                .collect(),
        }
    }

    #[test]
    fn horizon_periods_follow_last_observation() {
        let model = SeasonalTrendModel::default();
        let s = series(Metric::AverageRate, Period::new(2023, 10).unwrap(), &[1.0, 2.0, 3.0]);
        let out = MetricForecaster::new(&model, false).forecast(&s, 4).unwrap();

        let periods: Vec<String> = out.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(periods, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
    }

    #[test]
    fn too_short_series_is_insufficient_data() {
        let model = SeasonalTrendModel::default().with_min_points(5);
        let s = series(Metric::Occupancy, Period::new(2023, 1).unwrap(), &[1.0, 2.0]);
        let err = MetricForecaster::new(&model, false).forecast(&s, 3).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                metric: Metric::Occupancy,
                required: 5,
                actual: 2
            }
        ));

        let empty = Series {
            metric: Metric::Revenue,
            points: vec![],
        };
        assert!(MetricForecaster::new(&model, true).forecast(&empty, 3).is_err());
    }

    #[test]
    fn log_transform_round_trips_through_identity_like_model() {
        let model = SeasonalNaiveModel::new(12);
        let values: Vec<f64> = (0..12).map(|i| 100_000.0 + 2_500.0 * i as f64).collect();
        let s = series(Metric::Revenue, Period::new(2023, 1).unwrap(), &values);

        let plain = MetricForecaster::new(&model, false).forecast(&s, 12).unwrap();
        let logged = MetricForecaster::new(&model, true).forecast(&s, 12).unwrap();
        for ((p1, a), (p2, b)) in plain.iter().zip(&logged) {
            assert_eq!(p1, p2);
            assert!((a - b).abs() <= 1e-9 * a.abs(), "{a} vs {b}");
        }
    }

    #[test]
    fn zero_values_do_not_break_log_space() {
        let model = SeasonalNaiveModel::new(12);
        let s = series(Metric::Revenue, Period::new(2023, 1).unwrap(), &[0.0, 50.0]);
        let out = MetricForecaster::new(&model, true).forecast(&s, 2).unwrap();
        // ln(1) = 0 round-trips to 1.
        assert!((out[0].1 - 1.0).abs() < 1e-12);
        assert!((out[1].1 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn negative_values_are_rejected_in_log_space() {
        let model = SeasonalNaiveModel::new(12);
        let s = series(Metric::Revenue, Period::new(2023, 1).unwrap(), &[10.0, -5.0]);

        let err = MetricForecaster::new(&model, true).forecast(&s, 2).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Model {
                metric: Metric::Revenue,
                source: ModelError::NegativeLogInput { value, .. },
            } if value == -5.0
        ));
        assert!(MetricForecaster::new(&model, false).forecast(&s, 2).is_ok());
    }

    struct Broken;

    impl ForecastModel for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn min_points(&self) -> usize {
            1
        }
        fn fit(&self, _points: &[(Period, f64)]) -> Result<Box<dyn FittedModel>, ModelError> {
            Ok(Box::new(ShortPredictor))
        }
    }

    struct ShortPredictor;

    impl FittedModel for ShortPredictor {
        fn predict(&self, horizon: usize) -> Vec<f64> {
            vec![f64::NAN; horizon.saturating_sub(1)]
        }
    }

    #[test]
    fn wrong_length_output_is_a_model_error() {
        let s = series(Metric::Revenue, Period::new(2023, 1).unwrap(), &[1.0]);
        let err = MetricForecaster::new(&Broken, false).forecast(&s, 3).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Model {
                source: ModelError::WrongLength { expected: 3, actual: 2, .. },
                ..
            }
        ));
    }
}
