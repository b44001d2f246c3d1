//! Input/output helpers.
//!
//! - CSV ingest into a cleaned signal (`ingest`)
//! - JSON export of analysis results (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
