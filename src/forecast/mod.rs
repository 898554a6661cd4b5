//! Forecasting stage.
//!
//! Responsibilities:
//!
//! - wrap a pluggable model with per-metric transforms (`forecaster`)
//! - build one series per metric, fan out, join by period (`orchestrator`)

pub mod forecaster;
pub mod orchestrator;

pub use forecaster::*;
pub use orchestrator::*;
