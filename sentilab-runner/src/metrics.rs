//! Performance and sentiment statistics: pure functions over the record table.
//!
//! The equity curve of the strategy is `1 + cumulative_return` per row, so
//! every curve metric starts from one invested unit.

use serde::{Deserialize, Serialize};

use sentilab_core::domain::{DailyRecord, TradeSignal};

/// Aggregate performance of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    /// Fraction of return days spent long or short.
    pub exposure: f64,
    pub trading_days: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
}

impl PerformanceMetrics {
    pub fn compute(records: &[DailyRecord]) -> Self {
        let equity: Vec<f64> = records.iter().map(|r| 1.0 + r.cumulative_return).collect();
        let trading_days = records.len();
        let count = |signal: TradeSignal| records.iter().filter(|r| r.signal == signal).count();

        Self {
            total_return: total_return(&equity),
            cagr: cagr(&equity, trading_days),
            sharpe: sharpe_ratio(&equity, 0.0),
            sortino: sortino_ratio(&equity, 0.0),
            max_drawdown: max_drawdown(&equity),
            exposure: exposure(records),
            trading_days,
            buy_signals: count(TradeSignal::Buy),
            sell_signals: count(TradeSignal::Sell),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&final_eq)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (final_eq - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound Annual Growth Rate.
///
/// Assumes 252 trading days per year. Returns 0.0 for single-bar or
/// non-positive equity.
pub fn cagr(equity_curve: &[f64], trading_days: usize) -> f64 {
    if trading_days < 2 {
        return 0.0;
    }
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&final_eq)) if initial > 0.0 && final_eq > 0.0 => {
            let years = trading_days as f64 / 252.0;
            (final_eq / initial).powf(1.0 / years) - 1.0
        }
        _ => 0.0,
    }
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf) / std(daily returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / 252.0;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / std) * 252.0_f64.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
pub fn sortino_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / 252.0;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();

    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / downside_std) * 252.0_f64.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = match equity_curve.first() {
        Some(&first) => first,
        None => return 0.0,
    };
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of days (after the first) whose position, the previous day's
/// signal, was long or short.
pub fn exposure(records: &[DailyRecord]) -> f64 {
    if records.len() < 2 {
        return 0.0;
    }
    let active = records[..records.len() - 1]
        .iter()
        .filter(|r| r.signal.is_active())
        .count();
    active as f64 / (records.len() - 1) as f64
}

// ─── Sentiment summary ──────────────────────────────────────────────

/// Descriptive statistics of a column: count, mean, sample standard
/// deviation, min, quartiles (linear interpolation) and max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    /// `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// `None` for an empty column.
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count: values.len(),
            mean: mean_f64(values),
            std: (values.len() >= 2).then(|| std_dev(values)),
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    /// Summary of the merged sentiment column.
    pub fn sentiment(records: &[DailyRecord]) -> Option<Self> {
        let values: Vec<f64> = records.iter().map(|r| r.sentiment).collect();
        Self::describe(&values)
    }
}

/// Quantile of sorted values, linear interpolation between closest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compute daily returns from an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
