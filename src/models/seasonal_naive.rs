use tracing::debug;

use crate::domain::Period;
use crate::error::ModelError;
use crate::models::{FittedModel, ForecastModel};

const NAME: &str = "seasonal-naive";

/// Repeats the last seasonal cycle as the forecast.
///
/// With fewer observations than `season_length` the available tail is cycled.
#[derive(Debug, Clone)]
pub struct SeasonalNaiveModel {
    season_length: usize,
    min_points: usize,
}

impl SeasonalNaiveModel {
    pub fn new(season_length: usize) -> Self {
        Self {
            season_length: season_length.max(1),
            min_points: 1,
        }
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points.max(1);
        self
    }
}

impl ForecastModel for SeasonalNaiveModel {
    fn name(&self) -> &'static str {
        NAME
    }

    fn min_points(&self) -> usize {
        self.min_points
    }

    fn fit(&self, points: &[(Period, f64)]) -> Result<Box<dyn FittedModel>, ModelError> {
        if points.is_empty() {
            return Err(ModelError::Fit {
                model: NAME,
                reason: "empty series".to_string(),
            });
        }
        let n = points.len();
        let period = self.season_length.min(n);
        debug!(period, points = n, "fitted seasonal-naive model");

        Ok(Box::new(LastCycle {
            values: points[n - period..].iter().map(|(_, v)| *v).collect(),
        }))
    }
}

struct LastCycle {
    values: Vec<f64>,
}

impl FittedModel for LastCycle {
    fn predict(&self, horizon: usize) -> Vec<f64> {
        (0..horizon).map(|i| self.values[i % self.values.len()]).collect()
    }
}
