//! Tail models: fitted distributions and the fitters that produce them.
//!
//! Models are fit in model space (see `extremes::transformer`), so every
//! distribution here describes maxima or upper-tail exceedances.

use std::fmt;

use serde::Serialize;

use crate::domain::{Distribution, ModelConfig};
use crate::error::EvaError;

pub mod distribution;
pub mod emcee;
pub mod mle;

pub use distribution::{Family, Params};
pub use emcee::{EmceeModel, SamplerSettings};
pub use mle::MleModel;

/// Constraints derived from the extraction, applied to every fit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitConstraints {
    /// Fixed location (the POT threshold in model space).
    pub location: Option<f64>,
}

/// Return values at a list of exceedance probabilities, in model space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnValueSet {
    pub estimate: Vec<f64>,
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
}

impl ReturnValueSet {
    /// Estimates without an interval.
    pub fn point(estimate: Vec<f64>) -> Self {
        Self {
            estimate,
            lower: None,
            upper: None,
        }
    }
}

/// A distribution fitted to extremes.
pub trait TailModel: Send + Sync + fmt::Debug {
    /// Fitting approach (`MLE` / `Emcee`).
    fn name(&self) -> &'static str;
    fn distribution(&self) -> &Distribution;
    /// Point-estimate parameters.
    fn params(&self) -> Params;
    /// Log-likelihood of the fitted extremes at [`TailModel::params`].
    fn log_likelihood(&self) -> f64;
    fn free_parameters(&self) -> usize;

    fn pdf(&self, x: f64) -> f64;
    fn cdf(&self, x: f64) -> f64;
    fn isf(&self, p: f64) -> f64;

    /// Return values for exceedance probabilities in `(0, 1]`.
    ///
    /// `alpha` is the interval width (e.g. `0.95`); `None` skips interval
    /// estimation and leaves both bounds `None`.
    fn return_value(&self, probabilities: &[f64], alpha: Option<f64>) -> Result<ReturnValueSet, EvaError>;

    /// Extra `(label, value)` lines for the model section of reports.
    fn details(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Akaike information criterion.
    fn aic(&self) -> f64 {
        2.0 * self.free_parameters() as f64 - 2.0 * self.log_likelihood()
    }
}

/// Fits a [`TailModel`] to model-space extremes.
pub trait ModelFitter: Send + Sync {
    fn fit(
        &self,
        config: &ModelConfig,
        data: &[f64],
        distribution: &Distribution,
        constraints: FitConstraints,
    ) -> Result<Box<dyn TailModel>, EvaError>;
}

/// Maximum likelihood or ensemble MCMC, chosen by the [`ModelConfig`] variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFitter;

impl ModelFitter for DefaultFitter {
    fn fit(
        &self,
        config: &ModelConfig,
        data: &[f64],
        distribution: &Distribution,
        constraints: FitConstraints,
    ) -> Result<Box<dyn TailModel>, EvaError> {
        match *config {
            ModelConfig::PointEstimate {
                bootstrap_samples,
                seed,
            } => Ok(Box::new(MleModel::fit(
                data,
                distribution,
                constraints,
                bootstrap_samples,
                seed,
            )?)),
            ModelConfig::PosteriorSample {
                walkers,
                samples,
                burn_in,
                seed,
            } => Ok(Box::new(EmceeModel::fit(
                data,
                distribution,
                constraints,
                SamplerSettings {
                    walkers,
                    samples,
                    burn_in,
                    seed,
                },
            )?)),
        }
    }
}

pub(crate) fn validate_probabilities(probabilities: &[f64]) -> Result<(), EvaError> {
    match probabilities.iter().find(|&&p| !(p > 0.0 && p <= 1.0)) {
        Some(&probability) => Err(EvaError::InvalidProbability { probability }),
        None => Ok(()),
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<(), EvaError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(EvaError::InvalidParameter {
            parameter: "alpha",
            reason: format!("confidence interval width must be in (0, 1), got {alpha}"),
        })
    }
}
