//! Closed-form density, distribution and inverse-survival functions.
//!
//! Parameterisation (`loc`, `scale`, `shape`):
//!
//! - `genextreme`: `F(x) = exp(-(1 + ξ z)^(-1/ξ))`, `z = (x - loc) / scale`.
//!   `shape` is ξ, the extreme-value convention (ξ > 0 heavy tail). This is
//!   the negative of `scipy.stats.genextreme`'s `c`, so reports and exports
//!   label it `xi`.
//! - `gumbel_r`: the ξ = 0 limit, `F(x) = exp(-exp(-z))`.
//! - `genpareto`: `F(x) = 1 - (1 + ξ z)^(-1/ξ)` for `x ≥ loc`.
//! - `expon`: the ξ = 0 limit, `F(x) = 1 - exp(-z)`.
//!
//! Shapes closer to zero than [`SHAPE_EPS`] use the ξ = 0 formulas.

use serde::Serialize;

use crate::domain::Distribution;
use crate::error::EvaError;

/// Shape magnitudes below this are treated as exactly zero.
pub const SHAPE_EPS: f64 = 1e-10;

/// Distributions this crate can evaluate and fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    GenExtreme,
    Gumbel,
    GenPareto,
    Expon,
}

impl Family {
    pub fn of(distribution: &Distribution, model: &'static str) -> Result<Self, EvaError> {
        match distribution {
            Distribution::GenExtreme => Ok(Family::GenExtreme),
            Distribution::GumbelR => Ok(Family::Gumbel),
            Distribution::GenPareto => Ok(Family::GenPareto),
            Distribution::Expon => Ok(Family::Expon),
            Distribution::Other(name) => Err(EvaError::UnsupportedDistribution {
                name: name.clone(),
                model,
            }),
        }
    }

    pub fn has_shape(self) -> bool {
        matches!(self, Family::GenExtreme | Family::GenPareto)
    }

    /// Exceedance-type distributions, supported on `[loc, ∞)`.
    pub fn is_exceedance(self) -> bool {
        matches!(self, Family::GenPareto | Family::Expon)
    }
}

/// Fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Params {
    pub loc: f64,
    pub scale: f64,
    /// Tail index ξ; serialized as `xi`. Always 0 for `gumbel_r` and `expon`.
    #[serde(rename = "xi")]
    pub shape: f64,
}

impl Params {
    pub fn new(loc: f64, scale: f64, shape: f64) -> Self {
        Self { loc, scale, shape }
    }
}

pub fn logpdf(family: Family, params: &Params, x: f64) -> f64 {
    let Params { loc, scale, shape } = *params;
    if !(scale > 0.0) {
        return f64::NEG_INFINITY;
    }
    let z = (x - loc) / scale;
    match family {
        Family::Gumbel => -scale.ln() - z - (-z).exp(),
        Family::GenExtreme => {
            if shape.abs() < SHAPE_EPS {
                return -scale.ln() - z - (-z).exp();
            }
            let t = 1.0 + shape * z;
            if t <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let inv = 1.0 / shape;
            -scale.ln() - (1.0 + inv) * t.ln() - t.powf(-inv)
        }
        Family::Expon => {
            if z < 0.0 {
                return f64::NEG_INFINITY;
            }
            -scale.ln() - z
        }
        Family::GenPareto => {
            if z < 0.0 {
                return f64::NEG_INFINITY;
            }
            if shape.abs() < SHAPE_EPS {
                return -scale.ln() - z;
            }
            let t = 1.0 + shape * z;
            if t <= 0.0 {
                return f64::NEG_INFINITY;
            }
            -scale.ln() - (1.0 + 1.0 / shape) * t.ln()
        }
    }
}

pub fn pdf(family: Family, params: &Params, x: f64) -> f64 {
    logpdf(family, params, x).exp()
}

pub fn cdf(family: Family, params: &Params, x: f64) -> f64 {
    let Params { loc, scale, shape } = *params;
    let z = (x - loc) / scale;
    match family {
        Family::Gumbel => (-(-z).exp()).exp(),
        Family::GenExtreme => {
            if shape.abs() < SHAPE_EPS {
                return (-(-z).exp()).exp();
            }
            let t = 1.0 + shape * z;
            if t <= 0.0 {
                // Below the lower bound (ξ > 0) or above the upper bound (ξ < 0).
                return if shape > 0.0 { 0.0 } else { 1.0 };
            }
            (-t.powf(-1.0 / shape)).exp()
        }
        Family::Expon => {
            if z <= 0.0 {
                return 0.0;
            }
            -(-z).exp_m1()
        }
        Family::GenPareto => {
            if z <= 0.0 {
                return 0.0;
            }
            if shape.abs() < SHAPE_EPS {
                return -(-z).exp_m1();
            }
            let t = 1.0 + shape * z;
            if t <= 0.0 {
                return 1.0;
            }
            1.0 - t.powf(-1.0 / shape)
        }
    }
}

/// Inverse survival function: the value exceeded with probability `p`.
pub fn isf(family: Family, params: &Params, p: f64) -> f64 {
    let Params { loc, scale, shape } = *params;
    match family {
        Family::Gumbel => loc - scale * neg_ln_cdf(p).ln(),
        Family::GenExtreme => {
            let y = neg_ln_cdf(p);
            if shape.abs() < SHAPE_EPS {
                loc - scale * y.ln()
            } else {
                loc + scale / shape * (y.powf(-shape) - 1.0)
            }
        }
        Family::Expon => loc - scale * p.ln(),
        Family::GenPareto => {
            if shape.abs() < SHAPE_EPS {
                loc - scale * p.ln()
            } else {
                loc + scale / shape * (p.powf(-shape) - 1.0)
            }
        }
    }
}

/// `-ln(1 - p)`, accurate for small `p`.
fn neg_ln_cdf(p: f64) -> f64 {
    -(-p).ln_1p()
}

/// Sum of log-densities. `None` if any observation is outside the support.
pub fn log_likelihood(family: Family, params: &Params, data: &[f64]) -> Option<f64> {
    let ll: f64 = data.iter().map(|&x| logpdf(family, params, x)).sum();
    ll.is_finite().then_some(ll)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILIES: [Family; 4] = [Family::GenExtreme, Family::Gumbel, Family::GenPareto, Family::Expon];

    fn params_for(family: Family) -> Params {
        match family {
            Family::GenExtreme => Params::new(10.0, 2.0, 0.2),
            Family::Gumbel => Params::new(10.0, 2.0, 0.0),
            Family::GenPareto => Params::new(1.0, 0.5, -0.1),
            Family::Expon => Params::new(1.0, 0.5, 0.0),
        }
    }

    #[test]
    fn isf_inverts_survival() {
        for family in FAMILIES {
            let params = params_for(family);
            for &p in &[0.5, 0.1, 0.01, 0.001] {
                let x = isf(family, &params, p);
                let survival = 1.0 - cdf(family, &params, x);
                assert!((survival - p).abs() < 1e-9, "{family:?} p={p} got {survival}");
            }
        }
    }

    #[test]
    fn gumbel_matches_gev_limit() {
        let g = Params::new(0.0, 1.0, 0.0);
        for &x in &[-1.0, 0.0, 2.5] {
            assert_eq!(cdf(Family::Gumbel, &g, x), cdf(Family::GenExtreme, &g, x));
            assert!((pdf(Family::Gumbel, &g, x) - pdf(Family::GenExtreme, &g, x)).abs() < 1e-15);
        }
        // Known value: F(0) = exp(-1).
        assert!((cdf(Family::Gumbel, &g, 0.0) - (-1.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn density_integrates_to_one() {
        for family in FAMILIES {
            let params = params_for(family);
            let lo = isf(family, &params, 1.0 - 1e-9);
            let hi = isf(family, &params, 1e-9);
            let n = 20_000;
            let h = (hi - lo) / n as f64;
            let area: f64 = (0..n)
                .map(|i| pdf(family, &params, lo + (i as f64 + 0.5) * h) * h)
                .sum();
            assert!((area - 1.0).abs() < 1e-3, "{family:?} area {area}");
        }
    }

    #[test]
    fn support_bounds() {
        let gpd = params_for(Family::GenPareto);
        assert_eq!(logpdf(Family::GenPareto, &gpd, 0.5), f64::NEG_INFINITY);
        assert_eq!(cdf(Family::GenPareto, &gpd, 0.5), 0.0);
        assert!(log_likelihood(Family::GenPareto, &gpd, &[0.5, 2.0]).is_none());
        assert!(log_likelihood(Family::GenPareto, &gpd, &[1.5, 2.0]).is_some());
    }

    #[test]
    fn other_distribution_is_unsupported() {
        let err = Family::of(&Distribution::Other("weibull_min".to_string()), "MLE").unwrap_err();
        assert!(matches!(err, EvaError::UnsupportedDistribution { .. }));
    }
}
