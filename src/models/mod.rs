//! Pluggable forecasting capabilities.
//!
//! The pipeline only needs "fit a monthly series, produce N future point
//! estimates". `ForecastModel` captures exactly that so the orchestrator never
//! depends on a concrete algorithm.

pub mod seasonal_naive;
pub mod seasonal_trend;

pub use seasonal_naive::SeasonalNaiveModel;
pub use seasonal_trend::SeasonalTrendModel;

use crate::domain::{ForecastConfig, ModelSpec, Period};
use crate::error::ModelError;

/// A forecasting algorithm that can be fitted to a monthly series.
pub trait ForecastModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Minimum number of observations `fit` needs.
    fn min_points(&self) -> usize;

    /// Fit to `(period, value)` points sorted ascending by period.
    fn fit(&self, points: &[(Period, f64)]) -> Result<Box<dyn FittedModel>, ModelError>;
}

/// A fitted model, ready to extrapolate past its last observed period.
pub trait FittedModel: Send {
    /// Point estimates for the `horizon` months following the last observation.
    fn predict(&self, horizon: usize) -> Vec<f64>;
}

/// Build the configured model.
pub fn build_model(config: &ForecastConfig) -> Box<dyn ForecastModel> {
    match config.model {
        ModelSpec::SeasonalTrend => {
            let mut model = SeasonalTrendModel::new(config.seasonal_order, config.seasonal_min_points);
            if let Some(n) = config.min_points {
                model = model.with_min_points(n);
            }
            Box::new(model)
        }
        ModelSpec::SeasonalNaive => {
            let mut model = SeasonalNaiveModel::new(config.season_length);
            if let Some(n) = config.min_points {
                model = model.with_min_points(n);
            }
            Box::new(model)
        }
    }
}
