//! Reporting: the analysis self-description and formatted terminal tables.

pub mod describe;
pub mod format;

pub use describe::describe;
pub use format::{format_plot_header, format_summary};
