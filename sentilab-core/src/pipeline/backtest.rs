//! Backtest stage: lagged-signal strategy returns and their compounding.
//!
//! The signal computed on day i-1 is applied to the return earned from the
//! close of i-1 to the close of i. Row i therefore reads only `signal[i-1]`,
//! `close[i-1]` and `close[i]`.

use serde::{Deserialize, Serialize};

use crate::domain::{DailyRecord, TradeSignal};

/// Intermediate columns of the backtest, aligned with the record table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    /// Close-to-close return; `None` on row 0.
    pub daily_returns: Vec<Option<f64>>,
    /// Previous row's signal; `None` on row 0.
    pub shifted_signals: Vec<Option<TradeSignal>>,
    pub strategy_returns: Vec<Option<f64>>,
    pub cumulative: Vec<f64>,
}

impl BacktestOutcome {
    /// Cumulative return on the last row, 0.0 for an empty table.
    pub fn final_return(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}

/// Fill `strategy_return` and `cumulative_return` on every row.
pub fn run_backtest(records: &mut [DailyRecord]) -> BacktestOutcome {
    let n = records.len();
    let mut outcome = BacktestOutcome {
        daily_returns: Vec::with_capacity(n),
        shifted_signals: Vec::with_capacity(n),
        strategy_returns: Vec::with_capacity(n),
        cumulative: Vec::with_capacity(n),
    };

    let mut growth = 1.0;
    for i in 0..n {
        let (daily, shifted) = if i == 0 {
            (None, None)
        } else {
            let prev = &records[i - 1];
            (Some(records[i].close / prev.close - 1.0), Some(prev.signal))
        };
        let strategy = daily.zip(shifted).map(|(r, s)| s.exposure() * r);

        growth *= 1.0 + strategy.unwrap_or(0.0);
        let cumulative = growth - 1.0;

        records[i].strategy_return = strategy;
        records[i].cumulative_return = cumulative;

        outcome.daily_returns.push(daily);
        outcome.shifted_signals.push(shifted);
        outcome.strategy_returns.push(strategy);
        outcome.cumulative.push(cumulative);
    }

    tracing::info!(
        rows = n,
        final_return = outcome.final_return(),
        "backtest complete"
    );
    outcome
}
