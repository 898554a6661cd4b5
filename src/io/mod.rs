//! Input/output helpers.
//!
//! - raw row loading from CSV / JSON (`ingest`)
//! - processed-history, report and summary writers (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
