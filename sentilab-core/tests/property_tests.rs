//! Property tests for the record-table stages.
//!
//! Uses proptest to verify:
//! 1. Moving averages are trailing means with exactly `window - 1` undefined rows
//! 2. The sentiment merge never adds or drops price rows, even with repeated dates
//! 3. Signals are Flat whenever an average is undefined
//! 4. Strategy returns only see the previous signal (no look-ahead)
//! 5. All-flat signals leave the cumulative return at zero

use chrono::NaiveDate;
use proptest::prelude::*;
use sentilab_core::domain::{DailyRecord, TradeSignal};
use sentilab_core::pipeline::{
    apply_moving_averages, generate_signals, merge_sentiment, run_backtest, signal_for,
};
use sentilab_core::sentiment::SentimentSeries;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 0..max_len)
}

fn arb_signal() -> impl Strategy<Value = TradeSignal> {
    prop_oneof![
        Just(TradeSignal::Sell),
        Just(TradeSignal::Flat),
        Just(TradeSignal::Buy)
    ]
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Day offsets drawn from a narrow window so dates repeat often.
fn arb_repeating_offsets(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..10, 1..max_len)
}

fn make_records(closes: &[f64]) -> Vec<DailyRecord> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| DailyRecord::new(base_date() + chrono::Duration::days(i as i64), c))
        .collect()
}

// ── 1. Moving Average Definition ─────────────────────────────────────

proptest! {
    #[test]
    fn moving_average_is_trailing_mean(
        closes in arb_closes(120),
        short in 1usize..15,
        extra in 1usize..30,
    ) {
        let long = short + extra;
        let mut recs = make_records(&closes);
        apply_moving_averages(&mut recs, short, long);

        for (i, rec) in recs.iter().enumerate() {
            if i + 1 < short {
                prop_assert!(rec.ma_short.is_none());
            } else {
                let mean = closes[i + 1 - short..=i].iter().sum::<f64>() / short as f64;
                let got = rec.ma_short.unwrap();
                prop_assert!((got - mean).abs() < 1e-8 * mean.max(1.0));
            }
            prop_assert_eq!(rec.ma_long.is_some(), i + 1 >= long);
        }
    }
}

// ── 2. Merge Preserves Rows ──────────────────────────────────────────

proptest! {
    #[test]
    fn merge_preserves_row_count(
        closes in arb_closes(60),
        scores in prop::collection::vec((0i64..90, -1.0..=1.0_f64), 0..40),
    ) {
        let mut recs = make_records(&closes);
        let series: SentimentSeries = scores
            .iter()
            .map(|&(offset, s)| (base_date() + chrono::Duration::days(offset), s))
            .collect();

        let stats = merge_sentiment(&mut recs, &series);

        prop_assert_eq!(recs.len(), closes.len());
        prop_assert_eq!(stats.matched + stats.neutral, closes.len());
        prop_assert_eq!(stats.matched + stats.unmatched_sentiment, series.len());
        for rec in &recs {
            prop_assert_eq!(rec.sentiment, series.get(rec.date).unwrap_or(0.0));
        }
    }

    #[test]
    fn merge_with_repeated_dates_keeps_rows(
        offsets in arb_repeating_offsets(40),
        scores in prop::collection::vec((0i64..15, -1.0..=1.0_f64), 0..20),
    ) {
        let mut recs: Vec<DailyRecord> = offsets
            .iter()
            .map(|&o| DailyRecord::new(base_date() + chrono::Duration::days(o), 100.0))
            .collect();
        let series: SentimentSeries = scores
            .iter()
            .map(|&(offset, s)| (base_date() + chrono::Duration::days(offset), s))
            .collect();
        let price_dates: std::collections::HashSet<NaiveDate> =
            recs.iter().map(|r| r.date).collect();

        let stats = merge_sentiment(&mut recs, &series);

        prop_assert_eq!(recs.len(), offsets.len());
        prop_assert_eq!(stats.matched + stats.neutral, offsets.len());
        prop_assert!(stats.unmatched_sentiment <= series.len());
        prop_assert_eq!(
            stats.unmatched_sentiment,
            series.dates().filter(|d| !price_dates.contains(d)).count()
        );
        for rec in &recs {
            prop_assert_eq!(rec.sentiment, series.get(rec.date).unwrap_or(0.0));
        }
    }
}

// ── 3. Signal Domain ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn undefined_average_is_flat(
        ma in proptest::option::of(1.0..500.0_f64),
        sentiment in -1.0..=1.0_f64,
    ) {
        prop_assert_eq!(signal_for(ma, None, sentiment), TradeSignal::Flat);
        prop_assert_eq!(signal_for(None, ma, sentiment), TradeSignal::Flat);
    }

    #[test]
    fn signal_never_contradicts_sentiment(
        short in 1.0..500.0_f64,
        long in 1.0..500.0_f64,
        sentiment in -1.0..=1.0_f64,
    ) {
        match signal_for(Some(short), Some(long), sentiment) {
            TradeSignal::Buy => {
                prop_assert!(short > long && sentiment >= 0.0);
            }
            TradeSignal::Sell => {
                prop_assert!(short < long && sentiment <= 0.0);
            }
            TradeSignal::Flat => {}
        }
    }

    #[test]
    fn warmup_rows_stay_flat(closes in arb_closes(80)) {
        let mut recs = make_records(&closes);
        apply_moving_averages(&mut recs, 5, 20);
        generate_signals(&mut recs);
        for rec in recs.iter().take(19) {
            prop_assert_eq!(rec.signal, TradeSignal::Flat);
        }
    }
}

// ── 4. No Look-Ahead ─────────────────────────────────────────────────

proptest! {
    /// Changing the signal of the last row or any later close cannot move an
    /// earlier strategy return.
    #[test]
    fn strategy_return_uses_previous_signal_only(
        closes in prop::collection::vec(1.0..500.0_f64, 2..60),
        signals in prop::collection::vec(arb_signal(), 60),
        flip in arb_signal(),
    ) {
        let mut recs = make_records(&closes);
        for (rec, sig) in recs.iter_mut().zip(&signals) {
            rec.signal = *sig;
        }
        let mut altered = recs.clone();
        let last = altered.len() - 1;
        altered[last].signal = flip;
        altered[last].close *= 2.0;

        run_backtest(&mut recs);
        run_backtest(&mut altered);

        for i in 0..last {
            prop_assert_eq!(recs[i].strategy_return, altered[i].strategy_return);
        }
        for i in 1..recs.len() {
            let expected = recs[i - 1].signal.exposure() * (recs[i].close / recs[i - 1].close - 1.0);
            prop_assert_eq!(recs[i].strategy_return, Some(expected));
        }
        prop_assert_eq!(recs[0].strategy_return, None);
    }
}

// ── 5. Zero-Return Identity ──────────────────────────────────────────

proptest! {
    #[test]
    fn flat_book_has_zero_cumulative(closes in arb_closes(80)) {
        let mut recs = make_records(&closes);
        let outcome = run_backtest(&mut recs);
        prop_assert!(outcome.cumulative.iter().all(|&c| c == 0.0));
        prop_assert!(recs.iter().all(|r| r.cumulative_return == 0.0));
    }
}
