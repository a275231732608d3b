//! Trailing-window indicators over a close series.
//!
//! Indicators are pure functions: close history in, series of the same length
//! out. Warmup positions are `None`.

pub mod sma;

pub use sma::Sma;

/// An indicator over a close series.
///
/// # Look-ahead guard
/// The value at index t may only depend on closes at indices `..=t`.
/// Computing on a truncated series must reproduce the prefix of the full one.
pub trait Indicator: Send + Sync {
    /// Column-style name, e.g. "sma_50".
    fn name(&self) -> &str;

    /// Number of leading positions that are `None`.
    fn lookback(&self) -> usize;

    /// Compute over the whole series. Output length equals `closes.len()`.
    fn compute(&self, closes: &[f64]) -> Vec<Option<f64>>;
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
