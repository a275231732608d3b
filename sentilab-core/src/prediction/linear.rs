//! Ordinary least squares with intercept.
//!
//! Fits on centered data so the intercept drops out of the normal equations:
//! `β = (XcᵀXc)⁻¹ Xcᵀyc`, `intercept = ȳ - x̄·β`. A tiny ridge term keeps the
//! Gram matrix positive definite when features are nearly collinear (the two
//! moving averages usually are).

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::PredictionError;

const RIDGE: f64 = 1e-10;
const PIVOT_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Self, PredictionError> {
        if x.nrows() != y.len() {
            return Err(PredictionError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(PredictionError::EmptyTrainingSet);
        }

        let x_mean = x.mean_axis(Axis(0)).ok_or(PredictionError::EmptyTrainingSet)?;
        let y_mean = y.mean().ok_or(PredictionError::EmptyTrainingSet)?;
        let xc = &x - &x_mean;
        let yc = &y - y_mean;

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += RIDGE;
        }
        let rhs = xc.t().dot(&yc);

        let beta = match cholesky_solve(&gram, &rhs) {
            Some(beta) => beta,
            None => {
                tracing::debug!("Cholesky failed, falling back to Gaussian elimination");
                gaussian_solve(gram, rhs).ok_or(PredictionError::SingularMatrix)?
            }
        };

        let intercept = y_mean - x_mean.dot(&beta);
        Ok(Self {
            coefficients: beta.to_vec(),
            intercept,
        })
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, PredictionError> {
        if x.ncols() != self.coefficients.len() {
            return Err(PredictionError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.ncols(),
            });
        }
        let beta = ArrayView1::from(self.coefficients.as_slice());
        Ok(x.dot(&beta) + self.intercept)
    }
}

/// Solve `A x = b` for symmetric positive definite `A`. `None` if `A` is not.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Gaussian elimination with partial pivoting.
fn gaussian_solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();

    for col in 0..n {
        let pivot = (col..n).max_by(|&r1, &r2| a[[r1, col]].abs().total_cmp(&a[[r2, col]].abs()))?;
        if a[[pivot, col]].abs() < PIVOT_EPS {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| a[[i, j]] * x[j]).sum();
        x[i] = (b[i] - sum) / a[[i, i]];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
