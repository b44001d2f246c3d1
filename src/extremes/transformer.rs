//! Mapping between raw extremes and the space distributions are fit in.
//!
//! Every distribution in this crate models maxima / upper-tail exceedances, so
//! low extremes are negated on the way in and on the way out. High extremes
//! pass through unchanged. Both directions are exact: `inverse(forward(x)) == x`.

use crate::domain::{ExtremesType, MethodParameters};
use crate::extremes::ExtractionResult;

#[derive(Debug, Clone)]
pub struct Transformer {
    extremes_type: ExtremesType,
    location: Option<f64>,
    transformed: Vec<f64>,
}

impl Transformer {
    pub fn new(extraction: &ExtractionResult) -> Self {
        let extremes_type = extraction.extremes_type();
        let sign = sign(extremes_type);
        let location = match extraction.parameters() {
            MethodParameters::PeaksOverThreshold { threshold, .. } => Some(sign * threshold),
            MethodParameters::BlockMaxima { .. } => None,
        };
        let transformed = extraction.values().iter().map(|v| sign * v).collect();
        Self {
            extremes_type,
            location,
            transformed,
        }
    }

    /// Raw value → model space.
    pub fn forward(&self, value: f64) -> f64 {
        sign(self.extremes_type) * value
    }

    /// Model space → raw value.
    pub fn inverse(&self, value: f64) -> f64 {
        sign(self.extremes_type) * value
    }

    pub fn inverse_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse(v)).collect()
    }

    /// The extremes, in model space.
    pub fn transformed_extremes(&self) -> &[f64] {
        &self.transformed
    }

    /// Lower bound of the exceedances in model space (the threshold), when
    /// extremes came from peaks over threshold.
    pub fn location(&self) -> Option<f64> {
        self.location
    }
}

fn sign(extremes_type: ExtremesType) -> f64 {
    match extremes_type {
        ExtremesType::High => 1.0,
        ExtremesType::Low => -1.0,
    }
}
