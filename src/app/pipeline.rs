//! Shared analysis pipeline used by every CLI command.
//!
//! CSV ingest -> extraction -> fit. The commands then only differ in what
//! they print.

use tracing::info;

use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::eva::Eva;
use crate::io::ingest::load_signal;

/// Computed state of one `eva` run.
#[derive(Debug)]
pub struct RunOutput {
    pub eva: Eva,
    /// CSV data rows read, before cleaning.
    pub rows_read: usize,
}

/// Load the signal, extract extremes and fit the model.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let ingested = load_signal(&config.input, config.label.as_deref())?;

    let mut eva = Eva::new(ingested.signal);
    eva.get_extremes(config.extremes_type, config.extraction.clone())?;
    eva.fit_model(config.model.clone(), config.distribution.clone())?;
    info!(rows = ingested.rows_read, "analysis complete");

    Ok(RunOutput {
        eva,
        rows_read: ingested.rows_read,
    })
}
