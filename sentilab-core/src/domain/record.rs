//! DailyRecord: one row of the pipeline table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TradeSignal;

/// One trading day for the analyzed symbol.
///
/// The loader fills `date` and `close`. Every later field is owned by exactly
/// one stage: moving averages by the moving-average stage, `sentiment` by the
/// merge stage, `signal` by the signal stage and the two return fields by the
/// backtest stage. `None` marks an undefined value (warmup, first row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub sentiment: f64,
    pub signal: TradeSignal,
    pub strategy_return: Option<f64>,
    pub cumulative_return: f64,
}

impl DailyRecord {
    /// A freshly loaded row: only date and close are known.
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            ma_short: None,
            ma_long: None,
            sentiment: 0.0,
            signal: TradeSignal::Flat,
            strategy_return: None,
            cumulative_return: 0.0,
        }
    }

    /// Both moving averages are past their warmup.
    pub fn has_moving_averages(&self) -> bool {
        self.ma_short.is_some() && self.ma_long.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_neutral() {
        let rec = DailyRecord::new(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), 75.0);
        assert_eq!(rec.signal, TradeSignal::Flat);
        assert_eq!(rec.sentiment, 0.0);
        assert!(rec.strategy_return.is_none());
        assert!(!rec.has_moving_averages());
    }

    #[test]
    fn record_serialization_roundtrip() {
        let mut rec = DailyRecord::new(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), 75.0);
        rec.ma_short = Some(74.0);
        rec.signal = TradeSignal::Buy;
        let json = serde_json::to_string(&rec).unwrap();
        let back: DailyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
