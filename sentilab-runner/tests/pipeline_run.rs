//! Integration tests for the runner: offline runs from a CSV price file and a
//! headline file, through to saved artifacts.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::io::Write;
use std::path::{Path, PathBuf};

use sentilab_core::data::{DataSource, ParquetCache};
use sentilab_core::domain::TradeSignal;
use sentilab_core::prediction::PredictionOutcome;
use sentilab_runner::config::PipelineConfig;
use sentilab_runner::export::{load_artifacts, load_manifest, save_artifacts, PredictionSummary};
use sentilab_runner::runner::{run_pipeline, RunError, RunOptions};

fn weekdays(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut day = start;
    while out.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

/// A rising then falling close series in Yahoo's export format.
fn write_prices(path: &Path, dates: &[NaiveDate]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    for (i, date) in dates.iter().enumerate() {
        let trend = if i < 160 { i as f64 } else { 320.0 - i as f64 };
        let close = 100.0 + trend * 0.5 + (i % 5) as f64 * 0.3;
        writeln!(
            file,
            "{date},{close:.2},{:.2},{:.2},{close:.2},{close:.2},1000000",
            close + 1.0,
            close - 1.0
        )
        .unwrap();
    }
}

fn write_headlines(path: &Path, dates: &[NaiveDate]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "not-a-date hello").unwrap();
    for (i, date) in dates.iter().enumerate().step_by(3) {
        if i < 160 {
            writeln!(file, "{date} Company beats expectations with great record profit").unwrap();
        } else {
            writeln!(file, "{date} Company misses badly, terrible loss and lawsuit").unwrap();
        }
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    config: PipelineConfig,
    dates: Vec<NaiveDate>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let dates = weekdays(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(), 300);

    let prices = root.join("prices.csv");
    let headlines = root.join("news_headlines.txt");
    write_prices(&prices, &dates);
    write_headlines(&headlines, &dates);

    let config = PipelineConfig::from_toml(&format!(
        r#"
[pipeline]
symbol = "TEST"
start_date = "{start}"
end_date = "{end}"
headline_file_path = '{headlines}'

[moving_average]
short_window = 10
long_window = 40

[data]
csv_path = '{prices}'
"#,
        start = dates[0],
        end = dates[dates.len() - 1],
        headlines = headlines.display(),
        prices = prices.display(),
    ))
    .unwrap();

    Fixture {
        _dir: dir,
        root,
        config,
        dates,
    }
}

fn offline() -> RunOptions {
    RunOptions {
        offline: true,
        ..RunOptions::default()
    }
}

#[test]
fn offline_csv_run_produces_complete_result() {
    let fx = fixture();
    let cache = ParquetCache::new(fx.root.join("cache"));
    let result = run_pipeline(&fx.config, &cache, None, &offline()).unwrap();

    assert_eq!(result.data_source, DataSource::CsvImport);
    assert_eq!(result.records.len(), fx.dates.len());
    assert_eq!(result.skipped_headlines, 1);
    assert_eq!(result.merge.matched, fx.dates.len().div_ceil(3));

    // Warmup rows never trade.
    assert!(result.records[..39]
        .iter()
        .all(|r| r.signal == TradeSignal::Flat));
    // Uptrend with good news goes long, downtrend with bad news goes short.
    assert!(result.metrics.buy_signals > 0);
    assert!(result.metrics.sell_signals > 0);

    assert_eq!(result.records[0].cumulative_return, 0.0);
    assert!(result.records[0].strategy_return.is_none());
    assert!(
        (result.final_cumulative_return() - result.metrics.total_return).abs() < 1e-9,
        "cumulative and total return disagree"
    );

    let report = result.prediction.report().expect("prediction should run");
    // Rows 39..=298 have both averages and a next close.
    assert_eq!(report.train_rows + report.test_rows, fx.dates.len() - 40);
    assert_eq!(report.predictions.len(), report.test_rows);
}

#[test]
fn identical_configs_share_run_directory() {
    let fx = fixture();
    let cache = ParquetCache::new(fx.root.join("cache"));
    let out = fx.root.join("results");

    let first = run_pipeline(&fx.config, &cache, None, &offline()).unwrap();
    let second = run_pipeline(&fx.config, &cache, None, &offline()).unwrap();
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.records, second.records);

    let dir_a = save_artifacts(&first, &out).unwrap();
    let dir_b = save_artifacts(&second, &out).unwrap();
    assert_eq!(dir_a, dir_b);

    let loaded = load_artifacts(&dir_a).unwrap();
    assert_eq!(loaded.records, second.records);
    assert_eq!(loaded.dataset_hash, second.dataset_hash);

    let manifest = load_manifest(&dir_a).unwrap();
    assert_eq!(manifest.data_source, DataSource::CsvImport);
    assert!(matches!(manifest.prediction, PredictionSummary::Completed { .. }));
}

#[test]
fn prediction_can_be_disabled() {
    let mut fx = fixture();
    fx.config.prediction.enabled = false;
    let cache = ParquetCache::new(fx.root.join("cache"));
    let result = run_pipeline(&fx.config, &cache, None, &offline()).unwrap();
    assert!(matches!(result.prediction, PredictionOutcome::Skipped { .. }));

    let dir = save_artifacts(&result, &fx.root.join("results")).unwrap();
    assert!(!dir.join("predictions.csv").exists());
    assert!(dir.join("records.csv").exists());
}

#[test]
fn offline_without_any_price_source_fails() {
    let mut fx = fixture();
    fx.config.data.csv_path = None;
    let cache = ParquetCache::new(fx.root.join("cache"));
    let err = run_pipeline(&fx.config, &cache, None, &offline()).unwrap_err();
    assert!(matches!(err, RunError::Load(_)));
}

#[test]
fn missing_headline_file_aborts_run() {
    let mut fx = fixture();
    fx.config.pipeline.headline_file_path = fx.root.join("missing.txt");
    let cache = ParquetCache::new(fx.root.join("cache"));
    let err = run_pipeline(&fx.config, &cache, None, &offline()).unwrap_err();
    assert!(matches!(err, RunError::Sentiment(_)));
    assert!(err.to_string().contains("missing.txt"));
}
