//! Empirical (observed) return periods of extracted extremes.
//!
//! Each extreme gets an exceedance probability from its rank:
//!
//! ```text
//! p = (rank - alpha) / (n + 1 - alpha - beta)
//! ```
//!
//! with `rank = 1` for the most extreme event (ties share the average rank)
//! and `(alpha, beta)` from the chosen [`PlottingPosition`]. The return period
//! is `1 / p / rate`, `rate` being the number of extremes per return-period
//! unit.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::{ExtremesType, PlottingPosition, Signal};
use crate::error::EvaError;
use crate::eva::rate::occurrence_rate;
use crate::extremes::ExtractionResult;
use crate::math::average_ranks;

/// One extreme event with its empirical probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedReturnPeriod {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub exceedance_probability: f64,
    pub return_period: f64,
}

/// Empirical exceedance probabilities and return periods, in event order.
pub fn estimate(
    signal: &Signal,
    extraction: &ExtractionResult,
    return_period_size: Duration,
    plotting_position: PlottingPosition,
) -> Result<Vec<ObservedReturnPeriod>, EvaError> {
    let rate = occurrence_rate(signal, extraction, return_period_size)?;
    let probabilities = exceedance_probabilities(
        extraction.values(),
        extraction.extremes_type(),
        plotting_position,
    );

    Ok(extraction
        .iter()
        .zip(probabilities)
        .map(|((timestamp, value), p)| ObservedReturnPeriod {
            timestamp,
            value,
            exceedance_probability: p,
            return_period: 1.0 / p / rate,
        })
        .collect())
}

/// Plotting-position exceedance probability of each value.
pub fn exceedance_probabilities(
    values: &[f64],
    extremes_type: ExtremesType,
    plotting_position: PlottingPosition,
) -> Vec<f64> {
    let (alpha, beta) = plotting_position.alpha_beta();
    let n = values.len() as f64;
    let descending = extremes_type == ExtremesType::High;
    average_ranks(values, descending)
        .into_iter()
        .map(|rank| (rank - alpha) / (n + 1.0 - alpha - beta))
        .collect()
}
