//! Simple Moving Average (SMA).
//!
//! Trailing mean of closes over a fixed window. The window never wraps past
//! the start of the series: the first `period - 1` positions are `None`.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// `period` of zero is clamped to 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let n = closes.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        let window = self.period as f64;
        let mut sum: f64 = closes[..self.period].iter().sum();
        result[self.period - 1] = Some(sum / window);

        for i in self.period..n {
            if (i + 1) % self.period == 0 {
                // Re-anchor: an exact window sum bounds rounding drift.
                sum = closes[i + 1 - self.period..=i].iter().sum();
            } else {
                sum += closes[i] - closes[i - self.period];
            }
            result[i] = Some(sum / window);
        }

        result
    }
}
