//! Extreme-event occurrence rate and the exceedance probabilities derived
//! from it.
//!
//! - block maxima: one event per block, `rate = return_period_size / block_size`
//! - peaks over threshold: `rate = n_extremes / (signal span / return_period_size)`
//!
//! The POT rate is measured against the span of the whole signal, not the
//! span of the extracted events.

use chrono::Duration;

use crate::domain::{ExtractionMethod, MethodParameters, Signal, ratio};
use crate::error::EvaError;
use crate::extremes::ExtractionResult;

/// Average number of extreme events per `return_period_size`.
pub fn occurrence_rate(
    signal: &Signal,
    extraction: &ExtractionResult,
    return_period_size: Duration,
) -> Result<f64, EvaError> {
    if return_period_size <= Duration::zero() {
        return Err(EvaError::InvalidDuration {
            value: format!("{return_period_size}"),
            reason: "return period size must be positive".to_string(),
        });
    }

    match (extraction.method(), extraction.parameters()) {
        (ExtractionMethod::BlockMaxima, MethodParameters::BlockMaxima { block_size, .. }) => {
            Ok(ratio(return_period_size, *block_size))
        }
        (ExtractionMethod::PeaksOverThreshold, MethodParameters::PeaksOverThreshold { .. }) => {
            let n_periods = ratio(signal.span(), return_period_size);
            if !(n_periods > 0.0) {
                return Err(EvaError::InvalidParameter {
                    parameter: "return_period_size",
                    reason: "signal spans no time, occurrence rate is undefined".to_string(),
                });
            }
            Ok(extraction.len() as f64 / n_periods)
        }
        (method, parameters) => Err(EvaError::Internal(format!(
            "extraction method {method} does not match its parameters {parameters:?}"
        ))),
    }
}

/// `p = 1 / (T · rate)` for each return period `T`.
pub fn exceedance_probabilities(return_periods: &[f64], rate: f64) -> Result<Vec<f64>, EvaError> {
    return_periods
        .iter()
        .map(|&t| {
            if !(t.is_finite() && t > 0.0) {
                return Err(EvaError::InvalidParameter {
                    parameter: "return_period",
                    reason: format!("return periods must be positive and finite, got {t}"),
                });
            }
            Ok(1.0 / (t * rate))
        })
        .collect()
}
