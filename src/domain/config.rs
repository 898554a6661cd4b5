//! Pipeline configuration.
//!
//! A `PipelineConfig` is built once (environment + `.env`, then CLI overrides)
//! and passed by reference into every stage. Nothing reads the environment
//! after that point.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::domain::{DuplicatePolicy, ModelSpec, ReportFormat};
use crate::error::PipelineError;

/// Where documents live and which logical collections the stages use.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub database: String,
    pub source_collection: String,
    pub forecast_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            database: "hotel_budget".to_string(),
            source_collection: "historical_data".to_string(),
            forecast_collection: "predicted_data".to_string(),
        }
    }
}

/// Accepted input column names, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    pub revenue_aliases: Vec<String>,
    pub rate_aliases: Vec<String>,
    pub occupancy_aliases: Vec<String>,
    pub rooms_sold_aliases: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            revenue_aliases: owned(&[
                "revenue",
                "Room Revenue",
                "room_revenue",
                "Room_Revenue_per_month",
                "roomRevenue",
            ]),
            rate_aliases: owned(&["averageRate", "avg_adr", "adr", "average_rate"]),
            occupancy_aliases: owned(&[
                "occupancyPercent",
                "occupancy",
                "occupancy (%)",
                "occupancy_percent",
            ]),
            rooms_sold_aliases: owned(&["roomsSold", "rooms_sold", "rooms_sold_per_month"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Number of future months to produce.
    pub horizon: usize,
    pub model: ModelSpec,
    /// Overrides the model's own minimum history length when set.
    pub min_points: Option<usize>,
    /// Number of yearly Fourier harmonics for `seasonal-trend`.
    pub seasonal_order: usize,
    /// Distinct periods required before `seasonal-trend` adds seasonal terms.
    pub seasonal_min_points: usize,
    /// Cycle length for `seasonal-naive`.
    pub season_length: usize,
    /// Model revenue in log space.
    pub log_transform_revenue: bool,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            model: ModelSpec::SeasonalTrend,
            min_points: None,
            seasonal_order: 3,
            seasonal_min_points: 24,
            season_length: 12,
            log_transform_revenue: true,
            duplicate_policy: DuplicatePolicy::KeepLast,
        }
    }
}

/// Largest precision accepted for any bounded field. Beyond this an `f64`
/// carries no further decimal digits and the rounding scale overflows.
pub const MAX_DECIMALS: u32 = 15;

/// Value ranges and per-field precision enforced by the bounding pass.
///
/// A precision of `0` decimals stores the field as an integer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingPolicy {
    pub occupancy_min: f64,
    pub occupancy_max: f64,
    pub occupancy_decimals: u32,
    pub rate_decimals: u32,
    pub revenue_decimals: u32,
}

impl Default for BoundingPolicy {
    fn default() -> Self {
        Self {
            occupancy_min: 0.0,
            occupancy_max: 100.0,
            occupancy_decimals: 2,
            rate_decimals: 2,
            revenue_decimals: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./predicted_reports"),
            format: ReportFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub store: StoreConfig,
    pub schema: SchemaConfig,
    pub forecast: ForecastConfig,
    pub bounding: BoundingPolicy,
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = get("STORE_DIR") {
            config.store.root = PathBuf::from(v);
        }
        if let Some(v) = get("DB_NAME") {
            config.store.database = v;
        }
        if let Some(v) = get("SOURCE_COLLECTION_NAME") {
            config.store.source_collection = v;
        }
        if let Some(v) = get("FORECAST_COLLECTION_NAME") {
            config.store.forecast_collection = v;
        }
        if let Some(v) = get("REPORT_DIR") {
            config.report.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("FORECAST_HORIZON") {
            config.forecast.horizon = parse_number("FORECAST_HORIZON", &v)?;
        }
        if let Some(v) = get("FORECAST_MODEL") {
            config.forecast.model = parse_enum("FORECAST_MODEL", &v)?;
        }
        if let Some(v) = get("MIN_HISTORY_POINTS") {
            config.forecast.min_points = Some(parse_number("MIN_HISTORY_POINTS", &v)?);
        }
        if let Some(v) = get("DUPLICATE_POLICY") {
            config.forecast.duplicate_policy = parse_enum("DUPLICATE_POLICY", &v)?;
        }
        if let Some(v) = get("RATE_DECIMALS") {
            config.bounding.rate_decimals = parse_decimals("RATE_DECIMALS", &v)?;
        }
        if let Some(v) = get("REVENUE_DECIMALS") {
            config.bounding.revenue_decimals = parse_decimals("REVENUE_DECIMALS", &v)?;
        }
        if let Some(v) = get("OCCUPANCY_DECIMALS") {
            config.bounding.occupancy_decimals = parse_decimals("OCCUPANCY_DECIMALS", &v)?;
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, PipelineError> {
    value
        .parse::<T>()
        .map_err(|_| PipelineError::Config(format!("{key}: expected a non-negative integer, got '{value}'")))
}

fn parse_decimals(key: &str, value: &str) -> Result<u32, PipelineError> {
    let decimals: u32 = parse_number(key, value)?;
    if decimals > MAX_DECIMALS {
        return Err(PipelineError::Config(format!(
            "{key}: precision must be at most {MAX_DECIMALS}, got {decimals}"
        )));
    }
    Ok(decimals)
}

fn parse_enum<T: ValueEnum>(key: &str, value: &str) -> Result<T, PipelineError> {
    T::from_str(value, true).map_err(|_| {
        let allowed: Vec<String> = T::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value().map(|p| p.get_name().to_string()))
            .collect();
        PipelineError::Config(format!(
            "{key}: unknown value '{value}' (expected one of: {})",
            allowed.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_hotel_budget_collections() {
        let config = PipelineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.store.database, "hotel_budget");
        assert_eq!(config.store.source_collection, "historical_data");
        assert_eq!(config.store.forecast_collection, "predicted_data");
        assert_eq!(config.forecast.horizon, 12);
        assert_eq!(config.forecast.duplicate_policy, DuplicatePolicy::KeepLast);
        assert_eq!(config.bounding.rate_decimals, 2);
    }

    #[test]
    fn overrides_are_applied() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("FORECAST_COLLECTION_NAME", "fc"),
            ("FORECAST_HORIZON", "3"),
            ("FORECAST_MODEL", "seasonal-naive"),
            ("DUPLICATE_POLICY", "aggregate-mean"),
            ("RATE_DECIMALS", "0"),
            ("STORE_DIR", "  "),
        ]))
        .unwrap();
        assert_eq!(config.store.forecast_collection, "fc");
        assert_eq!(config.store.root, PathBuf::from("./data"));
        assert_eq!(config.forecast.horizon, 3);
        assert_eq!(config.forecast.model, ModelSpec::SeasonalNaive);
        assert_eq!(config.forecast.duplicate_policy, DuplicatePolicy::AggregateMean);
        assert_eq!(config.bounding.rate_decimals, 0);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = PipelineConfig::from_lookup(lookup(&[("FORECAST_HORIZON", "twelve")])).unwrap_err();
        assert!(err.to_string().contains("FORECAST_HORIZON"));

        let err = PipelineConfig::from_lookup(lookup(&[("DUPLICATE_POLICY", "newest")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("DUPLICATE_POLICY"));
        assert!(msg.contains("keep-last"));
    }

    #[test]
    fn precision_beyond_f64_digits_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("REVENUE_DECIMALS", "400")])).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ref msg) if msg.contains("REVENUE_DECIMALS")));

        let err = PipelineConfig::from_lookup(lookup(&[("RATE_DECIMALS", "4294967295")])).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        let config = PipelineConfig::from_lookup(lookup(&[("OCCUPANCY_DECIMALS", "15")])).unwrap();
        assert_eq!(config.bounding.occupancy_decimals, MAX_DECIMALS);
    }
}
