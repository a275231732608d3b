//! The record-table stages, in order: moving averages, sentiment merge,
//! signal, backtest.
//!
//! Each stage mutates the shared `DailyRecord` slice and writes only the
//! fields it owns. The prediction stage reads the table after the signal
//! stage and lives in [`crate::prediction`].

pub mod backtest;
pub mod merge;
pub mod moving_average;
pub mod signal;

pub use backtest::{run_backtest, BacktestOutcome};
pub use merge::{merge_sentiment, MergeStats};
pub use moving_average::{apply_moving_averages, records_from_bars};
pub use signal::{generate_signals, signal_for};

use crate::domain::DailyRecord;
use crate::sentiment::SentimentSeries;

/// Window lengths for the moving-average stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub short: usize,
    pub long: usize,
}

impl Default for Windows {
    fn default() -> Self {
        Self { short: 50, long: 200 }
    }
}

/// Result of running all four stages over a table.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub merge: MergeStats,
    pub backtest: BacktestOutcome,
}

/// Run moving averages, merge, signal and backtest in order.
pub fn run_stages(
    records: &mut [DailyRecord],
    sentiment: &SentimentSeries,
    windows: Windows,
) -> StageOutput {
    apply_moving_averages(records, windows.short, windows.long);
    let merge = merge_sentiment(records, sentiment);
    generate_signals(records);
    let backtest = run_backtest(records);
    StageOutput { merge, backtest }
}
