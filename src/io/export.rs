//! Export analysis results to JSON.
//!
//! The export is meant to be easy to consume in notebooks or downstream
//! scripts: run settings, fitted parameters, the summary table and the
//! empirical return periods of every extreme event.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ExtractionMethod, ExtremesType};
use crate::error::AppError;
use crate::eva::SummaryTable;
use crate::extremes::ObservedReturnPeriod;
use crate::models::Params;

/// Everything written by `--export`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisExport {
    pub tool: String,
    pub label: String,
    pub method: ExtractionMethod,
    pub extremes_type: ExtremesType,
    pub n_extremes: usize,
    pub model: String,
    pub distribution: String,
    pub parameters: Params,
    pub log_likelihood: f64,
    pub return_period_size: String,
    pub alpha: Option<f64>,
    pub summary: SummaryTable,
    pub observed: Vec<ObservedReturnPeriod>,
}

/// Write the export JSON file.
pub fn write_export_json(path: &Path, export: &AnalysisExport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eva::SummaryRow;

    #[test]
    fn export_serializes_tags_and_rows() {
        let export = AnalysisExport {
            tool: "eva".to_string(),
            label: "level".to_string(),
            method: ExtractionMethod::BlockMaxima,
            extremes_type: ExtremesType::High,
            n_extremes: 3,
            model: "MLE".to_string(),
            distribution: "gumbel_r".to_string(),
            parameters: Params::new(1.0, 2.0, 0.0),
            log_likelihood: -4.5,
            return_period_size: "1Y".to_string(),
            alpha: None,
            summary: SummaryTable {
                rows: vec![SummaryRow {
                    return_period: 10.0,
                    return_value: 5.5,
                    lower_ci: None,
                    upper_ci: None,
                }],
            },
            observed: Vec::new(),
        };
        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["method"], "BM");
        assert_eq!(value["extremes_type"], "high");
        assert_eq!(value["summary"]["rows"][0]["return_value"], 5.5);
        assert!(value["summary"]["rows"][0]["lower_ci"].is_null());
        assert_eq!(value["parameters"]["scale"], 2.0);
        assert_eq!(value["parameters"]["xi"], 0.0);
        assert!(value["parameters"].get("shape").is_none());
    }

    #[test]
    fn write_reports_bad_path() {
        let dir = std::env::temp_dir().join("eva-export-missing-dir").join("nested");
        let export = AnalysisExport {
            tool: "eva".to_string(),
            label: String::new(),
            method: ExtractionMethod::PeaksOverThreshold,
            extremes_type: ExtremesType::Low,
            n_extremes: 0,
            model: String::new(),
            distribution: String::new(),
            parameters: Params::new(0.0, 1.0, 0.0),
            log_likelihood: 0.0,
            return_period_size: String::new(),
            alpha: Some(0.95),
            summary: SummaryTable { rows: Vec::new() },
            observed: Vec::new(),
        };
        let err = write_export_json(&dir.join("out.json"), &export).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
