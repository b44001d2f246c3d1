//! Maximum likelihood fitting.
//!
//! The negative log-likelihood is minimized with Nelder-Mead over an
//! unconstrained parameter vector (see [`Layout`]). Confidence intervals come
//! from a non-parametric bootstrap: the extremes are resampled with
//! replacement, refit, and the return values of all refits give the
//! interval quantiles. Refits run on the rayon pool, each resample seeded
//! from the model seed and its index, so intervals are reproducible.

use std::f64::consts::PI;
use std::sync::OnceLock;

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::Distribution;
use crate::error::EvaError;
use crate::math::{fit_line, mean, quantile, variance};
use crate::models::distribution::{self, Family, Params};
use crate::models::{FitConstraints, ReturnValueSet, TailModel, validate_alpha, validate_probabilities};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
const MAX_ITERS: u64 = 2_000;

/// Where free parameters live in the optimizer's vector.
///
/// Scale is optimized as `ln(scale)`. Exceedance families keep their
/// location fixed (the threshold, or the sample minimum when none is given).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub family: Family,
    pub fixed_loc: Option<f64>,
}

impl Layout {
    pub fn new(family: Family, constraints: FitConstraints, data: &[f64]) -> Self {
        let fixed_loc = if family.is_exceedance() {
            Some(
                constraints
                    .location
                    .unwrap_or_else(|| data.iter().copied().fold(f64::INFINITY, f64::min)),
            )
        } else {
            None
        };
        Self { family, fixed_loc }
    }

    pub fn dim(&self) -> usize {
        usize::from(self.fixed_loc.is_none()) + 1 + usize::from(self.family.has_shape())
    }

    pub fn pack(&self, params: &Params) -> Vec<f64> {
        let mut theta = Vec::with_capacity(self.dim());
        if self.fixed_loc.is_none() {
            theta.push(params.loc);
        }
        theta.push(params.scale.ln());
        if self.family.has_shape() {
            theta.push(params.shape);
        }
        theta
    }

    pub fn unpack(&self, theta: &[f64]) -> Params {
        let mut it = theta.iter().copied();
        let loc = match self.fixed_loc {
            Some(loc) => loc,
            None => it.next().unwrap_or(f64::NAN),
        };
        let scale = it.next().map(f64::exp).unwrap_or(f64::NAN);
        let shape = if self.family.has_shape() {
            it.next().unwrap_or(f64::NAN)
        } else {
            0.0
        };
        Params { loc, scale, shape }
    }

    /// Log-likelihood at `theta`, `-inf` outside the support.
    pub fn log_likelihood(&self, theta: &[f64], data: &[f64]) -> f64 {
        let params = self.unpack(theta);
        distribution::log_likelihood(self.family, &params, data).unwrap_or(f64::NEG_INFINITY)
    }
}

/// Check the sample before any fit.
pub(crate) fn validate_data(data: &[f64], layout: &Layout, distribution: &Distribution) -> Result<(), EvaError> {
    let min = layout.dim().max(2);
    if data.len() < min {
        return Err(EvaError::InsufficientData { n: data.len(), min });
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(EvaError::FitFailed {
            distribution: distribution.to_string(),
            reason: "extreme values contain non-finite numbers".to_string(),
        });
    }
    if variance(data).is_none_or(|v| v <= 0.0) {
        return Err(EvaError::FitFailed {
            distribution: distribution.to_string(),
            reason: "extreme values are constant".to_string(),
        });
    }
    Ok(())
}

/// Starting point for the optimizer.
fn initial_guess(layout: &Layout, data: &[f64]) -> Params {
    match layout.fixed_loc {
        None => {
            let (loc, scale) = gumbel_guess(data);
            Params::new(loc, scale, 0.0)
        }
        Some(loc) => {
            let excess: Vec<f64> = data.iter().map(|x| x - loc).collect();
            let m = mean(&excess).unwrap_or(1.0);
            let v = variance(&excess).unwrap_or(1.0);
            if !layout.family.has_shape() || v <= 0.0 {
                return Params::new(loc, m.max(f64::EPSILON), 0.0);
            }
            let r = m * m / v;
            let mut shape = 0.5 * (1.0 - r);
            let mut scale = 0.5 * m * (1.0 + r);
            let max_excess = excess.iter().copied().fold(0.0, f64::max);
            // A negative shape must leave every exceedance inside the support.
            if !(scale > 0.0) || (shape < 0.0 && max_excess >= -scale / shape) {
                shape = 0.0;
                scale = m.max(f64::EPSILON);
            }
            Params::new(loc, scale, shape)
        }
    }
}

/// Gumbel location and scale from a probability-paper regression, falling
/// back to the method of moments.
fn gumbel_guess(data: &[f64]) -> (f64, f64) {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let reduced: Vec<f64> = (1..=sorted.len())
        .map(|i| -(-(i as f64 / (n + 1.0)).ln()).ln())
        .collect();

    match fit_line(&reduced, &sorted) {
        Some((loc, scale)) if scale > 0.0 && loc.is_finite() => (loc, scale),
        _ => {
            let m = mean(data).unwrap_or(0.0);
            let sd = variance(data).unwrap_or(1.0).sqrt();
            let scale = (sd * 6f64.sqrt() / PI).max(f64::EPSILON);
            (m - EULER_GAMMA * scale, scale)
        }
    }
}

struct NegLogLikelihood<'a> {
    layout: Layout,
    data: &'a [f64],
}

impl CostFunction for NegLogLikelihood<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let ll = self.layout.log_likelihood(theta, self.data);
        if ll.is_finite() { Ok(-ll) } else { Ok(f64::MAX) }
    }
}

/// Maximum likelihood parameters.
pub(crate) fn fit_params(layout: &Layout, data: &[f64]) -> Option<Params> {
    let start = initial_guess(layout, data);

    // Exponential scale has a closed form.
    if layout.family == Family::Expon {
        let ll = layout.log_likelihood(&layout.pack(&start), data);
        return ll.is_finite().then_some(start);
    }

    let x0 = layout.pack(&start);
    let steps: Vec<f64> = (0..x0.len())
        .map(|i| {
            // Location moves on the data scale, the rest in log / shape units.
            if i == 0 && layout.fixed_loc.is_none() {
                0.1 * start.scale
            } else {
                0.1
            }
        })
        .collect();
    let mut simplex = vec![x0.clone()];
    for (i, step) in steps.iter().enumerate() {
        let mut vertex = x0.clone();
        vertex[i] += step;
        simplex.push(vertex);
    }

    let cost = NegLogLikelihood { layout: *layout, data };
    let solver = NelderMead::new(simplex).with_sd_tolerance(1e-10).ok()?;
    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(MAX_ITERS))
        .run()
        .ok()?;

    let best = result.state().best_param.as_ref()?;
    let params = layout.unpack(best);
    layout.log_likelihood(best, data).is_finite().then_some(params)
}

/// Maximum likelihood model with bootstrap confidence intervals.
#[derive(Debug)]
pub struct MleModel {
    distribution: Distribution,
    layout: Layout,
    params: Params,
    log_likelihood: f64,
    data: Vec<f64>,
    bootstrap_samples: usize,
    seed: u64,
    bootstrap: OnceLock<Vec<Params>>,
}

impl MleModel {
    pub fn fit(
        data: &[f64],
        distribution: &Distribution,
        constraints: FitConstraints,
        bootstrap_samples: usize,
        seed: u64,
    ) -> Result<Self, EvaError> {
        let family = Family::of(distribution, "MLE")?;
        let layout = Layout::new(family, constraints, data);
        validate_data(data, &layout, distribution)?;

        let params = fit_params(&layout, data).ok_or_else(|| EvaError::FitFailed {
            distribution: distribution.to_string(),
            reason: "likelihood optimization did not reach a point inside the support".to_string(),
        })?;
        let log_likelihood = layout.log_likelihood(&layout.pack(&params), data);
        debug!(
            distribution = %distribution,
            loc = params.loc,
            scale = params.scale,
            shape = params.shape,
            log_likelihood,
            "maximum likelihood fit"
        );

        Ok(Self {
            distribution: distribution.clone(),
            layout,
            params,
            log_likelihood,
            data: data.to_vec(),
            bootstrap_samples,
            seed,
            bootstrap: OnceLock::new(),
        })
    }

    /// Parameters of the bootstrap refits, computed on first use.
    pub fn bootstrap_params(&self) -> &[Params] {
        self.bootstrap.get_or_init(|| {
            let n = self.data.len();
            let fits: Vec<Params> = (0..self.bootstrap_samples)
                .into_par_iter()
                .filter_map(|i| {
                    let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
                    let resample: Vec<f64> = (0..n).map(|_| self.data[rng.gen_range(0..n)]).collect();
                    // Degenerate resamples (all one value) cannot be refit.
                    if variance(&resample).is_none_or(|v| v <= 0.0) {
                        return None;
                    }
                    fit_params(&self.layout, &resample)
                })
                .collect();
            if fits.len() < self.bootstrap_samples {
                warn!(
                    failed = self.bootstrap_samples - fits.len(),
                    total = self.bootstrap_samples,
                    "bootstrap refits failed and were skipped"
                );
            }
            fits
        })
    }
}

impl TailModel for MleModel {
    fn name(&self) -> &'static str {
        "MLE"
    }

    fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    fn params(&self) -> Params {
        self.params
    }

    fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    fn free_parameters(&self) -> usize {
        self.layout.dim()
    }

    fn pdf(&self, x: f64) -> f64 {
        distribution::pdf(self.layout.family, &self.params, x)
    }

    fn cdf(&self, x: f64) -> f64 {
        distribution::cdf(self.layout.family, &self.params, x)
    }

    fn isf(&self, p: f64) -> f64 {
        distribution::isf(self.layout.family, &self.params, p)
    }

    fn return_value(&self, probabilities: &[f64], alpha: Option<f64>) -> Result<ReturnValueSet, EvaError> {
        validate_probabilities(probabilities)?;
        let estimate: Vec<f64> = probabilities.iter().map(|&p| self.isf(p)).collect();
        let Some(alpha) = alpha else {
            return Ok(ReturnValueSet::point(estimate));
        };
        validate_alpha(alpha)?;
        if self.bootstrap_samples == 0 {
            return Err(EvaError::InvalidParameter {
                parameter: "bootstrap_samples",
                reason: "confidence intervals need at least one bootstrap sample".to_string(),
            });
        }

        let fits = self.bootstrap_params();
        if fits.is_empty() {
            return Err(EvaError::FitFailed {
                distribution: self.distribution.to_string(),
                reason: "every bootstrap refit failed".to_string(),
            });
        }
        let family = self.layout.family;
        let (lower, upper): (Vec<f64>, Vec<f64>) = probabilities
            .iter()
            .map(|&p| {
                let values: Vec<f64> = fits.iter().map(|params| distribution::isf(family, params, p)).collect();
                interval(&values, alpha)
            })
            .unzip();
        Ok(ReturnValueSet {
            estimate,
            lower: Some(lower),
            upper: Some(upper),
        })
    }
}

/// Central interval of width `alpha`; NaN when no sample is finite.
pub(crate) fn interval(values: &[f64], alpha: f64) -> (f64, f64) {
    (
        quantile(values, (1.0 - alpha) / 2.0).unwrap_or(f64::NAN),
        quantile(values, (1.0 + alpha) / 2.0).unwrap_or(f64::NAN),
    )
}
