//! Error taxonomy for the forecast pipeline.
//!
//! Every public operation returns `Result<_, PipelineError>`. Stage-local error
//! types (`SchemaError`, `StorageError`, `ModelError`) convert into it with `?`.
//!
//! Exit codes follow the CLI convention:
//! - 2: usage / configuration / schema
//! - 3: data (not enough history, nothing to export)
//! - 4: model or internal consistency
//! - 5: storage

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{Metric, Period};

/// Malformed or missing required input fields.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column `year` not found in input rows")]
    MissingYear,

    #[error("required column `month` not found in input rows")]
    MissingMonth,

    #[error("no revenue column found (expected one of: {})", .aliases.join(", "))]
    MissingRevenue { aliases: Vec<String> },

    #[error("no valid rows remain after normalization ({dropped} of {read} rows dropped)")]
    NoValidRows { read: usize, dropped: usize },
}

/// Persistence failure. The pipeline never retries these internally.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("collection file '{}' is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {id} not found in collection '{collection}'")]
    NotFound { collection: String, id: u64 },

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a forecasting capability.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{model}: fit failed: {reason}")]
    Fit { model: &'static str, reason: String },

    #[error("{model}: produced {actual} estimates, expected {expected}")]
    WrongLength {
        model: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{model}: non-finite estimate at step {step}")]
    NonFinite { model: &'static str, step: usize },

    #[error("negative value {value} at {period} has no logarithm")]
    NegativeLogInput { period: Period, value: f64 },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("insufficient data for {metric}: need at least {required} points, got {actual}")]
    InsufficientData {
        metric: Metric,
        required: usize,
        actual: usize,
    },

    #[error("invalid forecast horizon: {0}")]
    InvalidHorizon(String),

    #[error("model error for {metric}: {source}")]
    Model {
        metric: Metric,
        #[source]
        source: ModelError,
    },

    #[error("inconsistent forecast: {0}")]
    InconsistentForecast(String),

    #[error("storage error after {written} of {total} writes: {source}")]
    PartialWrite {
        written: usize,
        total: usize,
        #[source]
        source: StorageError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("collection '{0}' is empty; nothing to process")]
    EmptyCollection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Schema(_) | PipelineError::InvalidHorizon(_) | PipelineError::Config(_) => 2,
            PipelineError::InsufficientData { .. } | PipelineError::EmptyCollection(_) => 3,
            PipelineError::Model { .. } | PipelineError::InconsistentForecast(_) => 4,
            PipelineError::PartialWrite { .. } | PipelineError::Storage(_) => 5,
            PipelineError::Io(_) | PipelineError::Json(_) | PipelineError::Csv(_) => 2,
        }
    }
}
