//! `hotel-forecast` library crate.
//!
//! The binary (`hf`) is a thin wrapper around this library so that:
//!
//! - every pipeline stage is testable without spawning processes
//! - an external orchestrator can call the stages directly
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod evaluate;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod store;
