//! Held-out regression metrics.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Coefficient of determination. 0.0 when the truth has no variance.
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// `None` for empty input.
    pub fn calculate(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Option<Self> {
        let n = y_true.len().min(y_pred.len());
        if n == 0 {
            return None;
        }
        let nf = n as f64;
        let residuals = || y_true.iter().zip(y_pred.iter()).map(|(t, p)| t - p);

        let ss_res: f64 = residuals().map(|e| e * e).sum();
        let mse = ss_res / nf;
        let mae = residuals().map(f64::abs).sum::<f64>() / nf;

        let y_mean = y_true.iter().take(n).sum::<f64>() / nf;
        let ss_tot: f64 = y_true.iter().take(n).map(|t| (t - y_mean).powi(2)).sum();
        let r2 = if ss_tot < 1e-12 { 0.0 } else { 1.0 - ss_res / ss_tot };

        Some(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: n,
        })
    }
}
