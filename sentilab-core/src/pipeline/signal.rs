//! Signal stage: moving-average crossover gated by sentiment.

use crate::domain::{DailyRecord, TradeSignal};

/// The per-day rule.
///
/// Buy when the short average is above the long one and sentiment is not
/// negative; Sell when it is below and sentiment is not positive. Everything
/// else, including any undefined average, is Flat.
pub fn signal_for(ma_short: Option<f64>, ma_long: Option<f64>, sentiment: f64) -> TradeSignal {
    let (Some(short), Some(long)) = (ma_short, ma_long) else {
        return TradeSignal::Flat;
    };
    if short > long && sentiment >= 0.0 {
        TradeSignal::Buy
    } else if short < long && sentiment <= 0.0 {
        TradeSignal::Sell
    } else {
        TradeSignal::Flat
    }
}

/// Write `signal` on every row from that row's own averages and sentiment.
pub fn generate_signals(records: &mut [DailyRecord]) {
    let mut buys = 0usize;
    let mut sells = 0usize;
    for record in records.iter_mut() {
        record.signal = signal_for(record.ma_short, record.ma_long, record.sentiment);
        match record.signal {
            TradeSignal::Buy => buys += 1,
            TradeSignal::Sell => sells += 1,
            TradeSignal::Flat => {}
        }
    }
    tracing::info!(buys, sells, rows = records.len(), "generated signals");
}
