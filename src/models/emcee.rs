//! Affine-invariant ensemble MCMC (Goodman & Weare stretch move).
//!
//! Walkers start in a small Gaussian ball around the maximum likelihood
//! estimate and are updated one at a time against the current ensemble. The
//! prior is flat on the unconstrained parameters (`loc`, `ln scale`,
//! `shape`), so the posterior is the likelihood restricted to the support.
//!
//! The point estimate is the highest-posterior sample; credible intervals are
//! quantiles of the return values of every post-burn-in sample.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, Normal};
use rayon::prelude::*;
use tracing::debug;

use crate::domain::Distribution;
use crate::error::EvaError;
use crate::models::distribution::{self, Family, Params};
use crate::models::mle::{Layout, fit_params, interval, validate_data};
use crate::models::{FitConstraints, ReturnValueSet, TailModel, validate_alpha, validate_probabilities};

/// Stretch-move scale.
const STRETCH: f64 = 2.0;
/// Relative spread of the initial walker ball.
const JITTER: f64 = 1e-2;
/// Draws per walker before giving up on a start inside the support.
const INIT_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    pub walkers: usize,
    /// Steps per walker.
    pub samples: usize,
    pub burn_in: usize,
    pub seed: u64,
}

#[derive(Debug)]
pub struct EmceeModel {
    distribution: Distribution,
    layout: Layout,
    settings: SamplerSettings,
    params: Params,
    log_likelihood: f64,
    /// `chain[step][walker]` in unconstrained coordinates.
    chain: Vec<Vec<Vec<f64>>>,
    acceptance: f64,
}

impl EmceeModel {
    pub fn fit(
        data: &[f64],
        distribution: &Distribution,
        constraints: FitConstraints,
        settings: SamplerSettings,
    ) -> Result<Self, EvaError> {
        let family = Family::of(distribution, "Emcee")?;
        let layout = Layout::new(family, constraints, data);
        validate_data(data, &layout, distribution)?;

        let dim = layout.dim();
        if settings.walkers < 2 * dim {
            return Err(EvaError::InvalidParameter {
                parameter: "walkers",
                reason: format!("need at least {} walkers for {dim} parameters", 2 * dim),
            });
        }
        if settings.samples == 0 {
            return Err(EvaError::InvalidParameter {
                parameter: "samples",
                reason: "at least one step per walker is required".to_string(),
            });
        }
        if settings.burn_in >= settings.samples {
            return Err(EvaError::InvalidParameter {
                parameter: "burn_in",
                reason: format!(
                    "burn-in ({}) must be shorter than the chain ({} steps)",
                    settings.burn_in, settings.samples
                ),
            });
        }

        let fit_failed = |reason: &str| EvaError::FitFailed {
            distribution: distribution.to_string(),
            reason: reason.to_string(),
        };
        let start = fit_params(&layout, data)
            .ok_or_else(|| fit_failed("no maximum likelihood starting point"))?;

        let mut rng = StdRng::seed_from_u64(settings.seed);
        let normal = Normal::new(0.0, 1.0).map_err(|e| EvaError::Internal(e.to_string()))?;
        let log_prob = |theta: &[f64]| layout.log_likelihood(theta, data);

        let centre = layout.pack(&start);
        let spread: Vec<f64> = (0..dim)
            .map(|i| {
                if i == 0 && layout.fixed_loc.is_none() {
                    JITTER * start.scale
                } else {
                    JITTER
                }
            })
            .collect();

        let mut positions = Vec::with_capacity(settings.walkers);
        let mut lps = Vec::with_capacity(settings.walkers);
        for _ in 0..settings.walkers {
            let mut placed = None;
            for _ in 0..INIT_ATTEMPTS {
                let theta: Vec<f64> = centre
                    .iter()
                    .zip(&spread)
                    .map(|(c, s)| c + s * normal.sample(&mut rng))
                    .collect();
                let lp = log_prob(&theta);
                if lp.is_finite() {
                    placed = Some((theta, lp));
                    break;
                }
            }
            let (theta, lp) = placed.ok_or_else(|| fit_failed("could not place walkers inside the support"))?;
            positions.push(theta);
            lps.push(lp);
        }

        let mut best = (centre.clone(), log_prob(&centre));
        let mut chain = Vec::with_capacity(settings.samples);
        let mut accepted = 0usize;

        for _ in 0..settings.samples {
            for k in 0..settings.walkers {
                let mut j = rng.gen_range(0..settings.walkers - 1);
                if j >= k {
                    j += 1;
                }
                let u: f64 = rng.gen_range(0.0..1.0);
                let z = ((STRETCH - 1.0) * u + 1.0).powi(2) / STRETCH;
                let proposal: Vec<f64> = positions[j]
                    .iter()
                    .zip(&positions[k])
                    .map(|(xj, xk)| xj + z * (xk - xj))
                    .collect();
                let lp = log_prob(&proposal);
                if !lp.is_finite() {
                    continue;
                }
                let log_accept = (dim as f64 - 1.0) * z.ln() + lp - lps[k];
                let r: f64 = rng.gen_range(0.0..1.0);
                if r.ln() < log_accept {
                    positions[k] = proposal;
                    lps[k] = lp;
                    accepted += 1;
                    if lp > best.1 {
                        best = (positions[k].clone(), lp);
                    }
                }
            }
            chain.push(positions.clone());
        }

        let acceptance = accepted as f64 / (settings.samples * settings.walkers) as f64;
        let params = layout.unpack(&best.0);
        debug!(
            distribution = %distribution,
            walkers = settings.walkers,
            samples = settings.samples,
            acceptance,
            loc = params.loc,
            scale = params.scale,
            shape = params.shape,
            "ensemble sampling finished"
        );

        Ok(Self {
            distribution: distribution.clone(),
            layout,
            settings,
            params,
            log_likelihood: best.1,
            chain,
            acceptance,
        })
    }

    pub fn settings(&self) -> SamplerSettings {
        self.settings
    }

    /// Mean fraction of accepted proposals.
    pub fn acceptance_fraction(&self) -> f64 {
        self.acceptance
    }

    /// Post-burn-in samples as parameters.
    pub fn posterior(&self) -> Vec<Params> {
        self.chain[self.settings.burn_in..]
            .iter()
            .flatten()
            .map(|theta| self.layout.unpack(theta))
            .collect()
    }
}

impl TailModel for EmceeModel {
    fn name(&self) -> &'static str {
        "Emcee"
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

        let posterior = self.posterior();
        let family = self.layout.family;
        let (lower, upper): (Vec<f64>, Vec<f64>) = probabilities
            .par_iter()
            .map(|&p| {
                let values: Vec<f64> = posterior.iter().map(|params| distribution::isf(family, params, p)).collect();
                interval(&values, alpha)
            })
            .unzip();
        Ok(ReturnValueSet {
            estimate,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Walkers", self.settings.walkers.to_string()),
            ("Samples per walker", self.settings.samples.to_string()),
        ]
    }
}
