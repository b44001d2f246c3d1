//! Least-squares line fits.
//!
//! Used to get starting values for likelihood maximisation: on probability
//! paper, GEV-family data lie roughly on a straight line
//!
//! ```text
//! x_i ≈ loc + scale · g(p_i)
//! ```
//!
//! where `g` is the reduced variate of the distribution and `p_i` a plotting
//! position. Regressing the sorted sample on `g(p_i)` gives `loc` and `scale`.
//!
//! Implementation choices:
//! - SVD solve, so a tall design matrix (many more rows than columns) is fine.
//! - Progressively looser tolerances before giving up on near-singular input.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = intercept + slope · x`. Returns `(intercept, slope)`.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi;
    }
    let beta = solve_least_squares(&design, &DVector::from_column_slice(y))?;
    Some((beta[0], beta[1]))
}
