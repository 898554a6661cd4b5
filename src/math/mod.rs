//! Numeric utilities: least squares, seasonal basis, and summary statistics.

pub mod basis;
pub mod ols;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use stats::*;
