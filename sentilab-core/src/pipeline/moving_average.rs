//! Moving-average stage: fills `ma_short` and `ma_long`.

use crate::data::RawBar;
use crate::domain::DailyRecord;
use crate::indicators::{Indicator, Sma};

/// Build the initial record table from validated bars.
///
/// `adjusted` selects the adjusted close where the bar carries one.
pub fn records_from_bars(bars: &[RawBar], adjusted: bool) -> Vec<DailyRecord> {
    bars.iter()
        .map(|bar| DailyRecord::new(bar.date, bar.price(adjusted)))
        .collect()
}

/// Trailing-mean columns for the short and long windows.
///
/// Only the two moving-average fields are written.
pub fn apply_moving_averages(records: &mut [DailyRecord], short_window: usize, long_window: usize) {
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    let short = Sma::new(short_window).compute(&closes);
    let long = Sma::new(long_window).compute(&closes);

    for ((record, s), l) in records.iter_mut().zip(short).zip(long) {
        record.ma_short = s;
        record.ma_long = l;
    }

    let first_defined = records.iter().position(DailyRecord::has_moving_averages);
    tracing::info!(
        rows = records.len(),
        short_window,
        long_window,
        first_defined = ?first_defined,
        "computed moving averages"
    );
}
