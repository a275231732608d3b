//! Pipeline runner: wires loading, sentiment, the stages, prediction and
//! metrics together.
//!
//! Two entry points:
//! - `run_pipeline()`: loads prices and headlines, then runs. Used by the CLI.
//! - `run_pipeline_from_data()`: takes pre-loaded prices and sentiment, no I/O.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentilab_core::data::{DataProvider, DataSource, ParquetCache};
use sentilab_core::domain::DailyRecord;
use sentilab_core::pipeline::{records_from_bars, run_stages, MergeStats};
use sentilab_core::prediction::{predict_next_close, PredictionError, PredictionOutcome};
use sentilab_core::sentiment::{
    load_daily_sentiment, DailySentiment, PolarityScorer, SentimentError, VaderScorer,
};

use crate::config::{ConfigError, PipelineConfig, RunId};
use crate::data_loader::{load_prices, LoadError, LoadOptions, LoadedPrices};
use crate::metrics::{ColumnSummary, PerformanceMetrics};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("price data error: {0}")]
    Load(#[from] LoadError),
    #[error("sentiment error: {0}")]
    Sentiment(#[from] SentimentError),
    #[error("prediction error: {0}")]
    Prediction(#[from] PredictionError),
    #[error("price dates must be strictly ascending: {date} follows {previous}")]
    UnorderedPrices {
        previous: NaiveDate,
        date: NaiveDate,
    },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Run switches that are not part of the reproducible config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub offline: bool,
    pub synthetic: bool,
    pub force_download: bool,
}

/// Complete result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: PipelineConfig,
    pub records: Vec<DailyRecord>,
    pub merge: MergeStats,
    pub metrics: PerformanceMetrics,
    pub sentiment_summary: Option<ColumnSummary>,
    pub prediction: PredictionOutcome,
    pub data_source: DataSource,
    pub dataset_hash: String,
    pub headline_count: usize,
    pub skipped_headlines: usize,
    pub completed_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn final_cumulative_return(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.cumulative_return)
    }

    pub fn is_synthetic(&self) -> bool {
        self.data_source == DataSource::Synthetic
    }

    /// Rows whose signal is Buy or Sell.
    pub fn active_signals(&self) -> impl Iterator<Item = &DailyRecord> {
        self.records.iter().filter(|r| r.signal.is_active())
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load prices and headlines for `config`, then run the whole pipeline.
pub fn run_pipeline(
    config: &PipelineConfig,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    options: &RunOptions,
) -> Result<PipelineResult, RunError> {
    config.validate()?;

    let load_opts = LoadOptions {
        start: config.pipeline.start_date,
        end: config.pipeline.end_date,
        offline: options.offline,
        synthetic: options.synthetic,
        force: options.force_download,
        csv_path: config.data.csv_path.clone(),
    };
    let prices = load_prices(&config.pipeline.symbol, cache, provider, &load_opts)?;

    let scorer = VaderScorer::new();
    let sentiment = load_daily_sentiment(&config.pipeline.headline_file_path, &scorer)?;

    run_pipeline_from_data(config, prices, sentiment)
}

/// Run the stages on pre-loaded inputs.
///
/// Bars must have strictly ascending dates, as `load_prices` guarantees.
pub fn run_pipeline_from_data(
    config: &PipelineConfig,
    prices: LoadedPrices,
    sentiment: DailySentiment,
) -> Result<PipelineResult, RunError> {
    if let Some(pair) = prices.bars.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(RunError::UnorderedPrices {
            previous: pair[0].date,
            date: pair[1].date,
        });
    }

    let mut records = records_from_bars(&prices.bars, config.data.adjusted);
    let stages = run_stages(&mut records, &sentiment.series, config.windows());

    let prediction = if config.prediction.enabled {
        predict_next_close(&records, config.prediction_params())?
    } else {
        PredictionOutcome::Skipped {
            reason: "prediction disabled".into(),
        }
    };

    let metrics = PerformanceMetrics::compute(&records);
    tracing::info!(
        symbol = %config.pipeline.symbol,
        rows = records.len(),
        final_return = stages.backtest.final_return(),
        "pipeline complete"
    );

    Ok(PipelineResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        config: config.clone(),
        sentiment_summary: ColumnSummary::sentiment(&records),
        records,
        merge: stages.merge,
        metrics,
        prediction,
        data_source: prices.source,
        dataset_hash: prices.dataset_hash,
        headline_count: sentiment.headline_count,
        skipped_headlines: sentiment.skipped.len(),
        completed_at: Utc::now(),
    })
}

/// Score headlines with a custom scorer and run on pre-loaded prices.
pub fn run_with_scorer(
    config: &PipelineConfig,
    prices: LoadedPrices,
    scorer: &dyn PolarityScorer,
) -> Result<PipelineResult, RunError> {
    let sentiment = load_daily_sentiment(&config.pipeline.headline_file_path, scorer)?;
    run_pipeline_from_data(config, prices, sentiment)
}
