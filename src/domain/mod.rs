//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the cleaned input series (`Signal`)
//! - durations for block sizes, windows and return-period units
//! - method, distribution and model tags plus their settings

pub mod duration;
pub mod signal;
pub mod types;

pub use duration::*;
pub use signal::*;
pub use types::*;
