//! `eva-pipeline` library crate.
//!
//! Extreme value analysis of a time series: extract extreme events by block
//! maxima or peaks over threshold, fit a tail distribution by maximum
//! likelihood or ensemble MCMC, and convert return periods to return values.
//!
//! The binary (`eva`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the [`eva::Eva`] orchestrator can be embedded elsewhere

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod eva;
pub mod extremes;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

pub use error::{AppError, ErrorKind, EvaError};
pub use eva::Eva;
