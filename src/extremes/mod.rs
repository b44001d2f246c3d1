//! Extreme value extraction and everything bound to one extraction result.
//!
//! - block maxima / peaks-over-threshold extraction (`block_maxima`,
//!   `peaks_over_threshold`, dispatched by [`DefaultExtractor`])
//! - the raw ↔ model-space mapping (`transformer`)
//! - empirical return periods by plotting position (`return_periods`)

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{
    ExtractionMethod, ExtractionParams, ExtremesType, MethodParameters, Signal,
};
use crate::error::EvaError;

pub mod block_maxima;
pub mod peaks_over_threshold;
pub mod return_periods;
pub mod transformer;

pub use return_periods::ObservedReturnPeriod;
pub use transformer::Transformer;

/// Extreme events taken from a signal, with the settings that produced them.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    name: String,
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
    method: ExtractionMethod,
    extremes_type: ExtremesType,
    parameters: MethodParameters,
}

impl ExtractionResult {
    /// Assemble a result. The method is implied by `parameters`.
    pub fn new(
        name: impl Into<String>,
        events: Vec<(NaiveDateTime, f64)>,
        extremes_type: ExtremesType,
        parameters: MethodParameters,
    ) -> Self {
        let method = match parameters {
            MethodParameters::BlockMaxima { .. } => ExtractionMethod::BlockMaxima,
            MethodParameters::PeaksOverThreshold { .. } => ExtractionMethod::PeaksOverThreshold,
        };
        let (timestamps, values) = events.into_iter().unzip();
        Self {
            name: name.into(),
            timestamps,
            values,
            method,
            extremes_type,
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    pub fn extremes_type(&self) -> ExtremesType {
        self.extremes_type
    }

    pub fn parameters(&self) -> &MethodParameters {
        &self.parameters
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Smallest and largest extreme value.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min.is_finite() && max.is_finite()).then_some((min, max))
    }
}

/// Produces extreme events from a signal.
pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        signal: &Signal,
        extremes_type: ExtremesType,
        params: &ExtractionParams,
    ) -> Result<ExtractionResult, EvaError>;
}

/// Block maxima and peaks-over-threshold as implemented in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

impl Extractor for DefaultExtractor {
    fn extract(
        &self,
        signal: &Signal,
        extremes_type: ExtremesType,
        params: &ExtractionParams,
    ) -> Result<ExtractionResult, EvaError> {
        let (events, parameters) = match params {
            ExtractionParams::BlockMaxima { block_size, errors } => {
                let block_size = block_size.resolve()?;
                let events = block_maxima::extract(signal, extremes_type, block_size, *errors)?;
                (
                    events,
                    MethodParameters::BlockMaxima {
                        block_size,
                        errors: *errors,
                    },
                )
            }
            ExtractionParams::PeaksOverThreshold { threshold, window } => {
                let threshold = threshold.ok_or(EvaError::MissingParameter {
                    method: "POT",
                    parameter: "threshold",
                })?;
                let events = peaks_over_threshold::extract(
                    signal,
                    extremes_type,
                    threshold,
                    window.resolve()?,
                )?;
                (
                    events,
                    MethodParameters::PeaksOverThreshold {
                        threshold,
                        window: window.clone(),
                    },
                )
            }
        };

        if events.is_empty() {
            return Err(EvaError::NoExtremes {
                reason: format!("{} extraction selected no events", params.method()),
            });
        }
        debug!(n = events.len(), method = %params.method(), "extracted extreme events");

        Ok(ExtractionResult::new(
            signal.name(),
            events,
            extremes_type,
            parameters,
        ))
    }
}

/// True when `candidate` is more extreme than `current`.
pub(crate) fn more_extreme(extremes_type: ExtremesType, candidate: f64, current: f64) -> bool {
    match extremes_type {
        ExtremesType::High => candidate > current,
        ExtremesType::Low => candidate < current,
    }
}
