//! CSV ingest.
//!
//! Expected layout: a header row, then one observation per row with the
//! timestamp in the first column and the value in the second. Extra columns
//! are ignored. Empty, `nan`, `NA` and `null` values are nulls and are
//! dropped while the [`Signal`] is cleaned.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::domain::Signal;
use crate::error::AppError;

/// Ingest output: the cleaned signal and how many rows were read.
#[derive(Debug, Clone)]
pub struct IngestedSignal {
    pub signal: Signal,
    pub rows_read: usize,
}

/// Load a signal from a CSV file. `label` defaults to the value column header.
pub fn load_signal(path: &Path, label: Option<&str>) -> Result<IngestedSignal, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_signal(file, label)?;
    info!(
        path = %path.display(),
        rows = ingested.rows_read,
        observations = ingested.signal.len(),
        "loaded signal"
    );
    Ok(ingested)
}

/// Read a signal from any CSV source.
pub fn read_signal<R: Read>(source: R, label: Option<&str>) -> Result<IngestedSignal, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    if headers.len() < 2 {
        return Err(AppError::new(
            2,
            format!("CSV needs a timestamp and a value column, found {} column(s)", headers.len()),
        ));
    }

    let name = label
        .map(str::to_string)
        .or_else(|| headers.get(1).map(str::to_string))
        .unwrap_or_default();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::new(2, format!("Failed to read CSV row {}: {e}", i + 2)))?;
        let timestamp = record.get(0).unwrap_or("").to_string();
        let value = record.get(1).unwrap_or("").to_string();
        rows.push((timestamp, value));
    }

    let rows_read = rows.len();
    let signal = Signal::parse(name, rows)?;
    Ok(IngestedSignal { signal, rows_read })
}
