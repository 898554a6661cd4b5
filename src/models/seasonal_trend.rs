//! Linear trend plus yearly seasonality, fitted by least squares.
//!
//! ```text
//! y(t) = β0 + β1·t + Σ_k [ a_k·sin(2πk·m/12) + b_k·cos(2πk·m/12) ]
//! ```
//!
//! where `t` is years since the first observation and `m` the month of year.
//! This is the additive trend + yearly-seasonality decomposition the hotel
//! metrics are modelled with. Seasonal terms are only added once the history
//! has enough distinct months to identify them; shorter histories get the
//! trend line alone.

use nalgebra::DVector;
use tracing::debug;

use crate::domain::Period;
use crate::error::ModelError;
use crate::math::{design_matrix, fourier_width, push_fourier_terms, solve_least_squares};
use crate::models::{FittedModel, ForecastModel};

const NAME: &str = "seasonal-trend";

/// Intercept and slope need two points.
const DEFAULT_MIN_POINTS: usize = 2;

#[derive(Debug, Clone)]
pub struct SeasonalTrendModel {
    order: usize,
    seasonal_min_points: usize,
    min_points: usize,
}

impl SeasonalTrendModel {
    /// `order` yearly harmonics, enabled once `seasonal_min_points` distinct
    /// periods are observed.
    pub fn new(order: usize, seasonal_min_points: usize) -> Self {
        Self {
            order,
            seasonal_min_points,
            min_points: DEFAULT_MIN_POINTS,
        }
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points.max(1);
        self
    }
}

impl Default for SeasonalTrendModel {
    fn default() -> Self {
        Self::new(3, 24)
    }
}

impl ForecastModel for SeasonalTrendModel {
    fn name(&self) -> &'static str {
        NAME
    }

    fn min_points(&self) -> usize {
        self.min_points
    }

    fn fit(&self, points: &[(Period, f64)]) -> Result<Box<dyn FittedModel>, ModelError> {
        let (Some(&(origin, _)), Some(&(last, _))) = (points.first(), points.last()) else {
            return Err(ModelError::Fit {
                model: NAME,
                reason: "empty series".to_string(),
            });
        };

        let distinct = {
            let mut periods: Vec<Period> = points.iter().map(|(p, _)| *p).collect();
            periods.dedup();
            periods.len()
        };
        let order = if distinct >= self.seasonal_min_points { self.order } else { 0 };
        // Never fit more columns than distinct periods.
        let order = if 2 + fourier_width(order) > distinct { 0 } else { order };

        let rows: Vec<Vec<f64>> = points
            .iter()
            .map(|(p, _)| design_row(origin, *p, order))
            .collect();
        let x = design_matrix(&rows).ok_or_else(|| ModelError::Fit {
            model: NAME,
            reason: "could not build design matrix".to_string(),
        })?;
        let y = DVector::from_iterator(points.len(), points.iter().map(|(_, v)| *v));

        let beta = solve_least_squares(&x, &y).ok_or_else(|| ModelError::Fit {
            model: NAME,
            reason: "least squares system is ill-conditioned".to_string(),
        })?;

        debug!(
            points = points.len(),
            distinct_periods = distinct,
            seasonal_order = order,
            slope_per_year = beta[1],
            "fitted seasonal-trend model"
        );

        Ok(Box::new(FittedSeasonalTrend {
            origin,
            last,
            order,
            betas: beta.iter().copied().collect(),
        }))
    }
}

#[derive(Debug, Clone)]
struct FittedSeasonalTrend {
    origin: Period,
    last: Period,
    order: usize,
    betas: Vec<f64>,
}

impl FittedModel for FittedSeasonalTrend {
    fn predict(&self, horizon: usize) -> Vec<f64> {
        self.last
            .following(horizon)
            .into_iter()
            .map(|p| {
                design_row(self.origin, p, self.order)
                    .iter()
                    .zip(&self.betas)
                    .map(|(x, b)| x * b)
                    .sum()
            })
            .collect()
    }
}

/// `[1, t, sin/cos harmonics...]` for `period`, with `t` in years since `origin`.
fn design_row(origin: Period, period: Period, order: usize) -> Vec<f64> {
    let t = (period.index() - origin.index()) as f64 / 12.0;
    let mut row = Vec::with_capacity(2 + fourier_width(order));
    row.push(1.0);
    row.push(t);
    push_fourier_terms(period.month(), order, &mut row);
    row
}
