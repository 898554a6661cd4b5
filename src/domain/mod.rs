//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calendar periods, metrics and record shapes (`types`)
//! - lenient value coercion for loosely-typed documents (`coerce`)
//! - the pipeline configuration threaded through every stage (`config`)

pub mod coerce;
pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
