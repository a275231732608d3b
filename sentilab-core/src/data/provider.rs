//! Price provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance, CSV
//! files) so the loader can swap implementations and tests can mock them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily price row from a provider, before ingest validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub close: f64,
    /// Split/dividend adjusted close, when the source has one.
    pub adj_close: Option<f64>,
    pub volume: u64,
}

impl RawBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            adj_close: None,
            volume: 0,
        }
    }

    /// The price the pipeline trades on.
    ///
    /// Falls back to the raw close when no adjusted close is available.
    pub fn price(&self, adjusted: bool) -> f64 {
        match (adjusted, self.adj_close) {
            (true, Some(adj)) if adj.is_finite() => adj,
            _ => self.close,
        }
    }
}

/// Structured error types for price data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("http client error: {0}")]
    HttpClient(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv import error: {0}")]
    CsvError(String),

    #[error("no cached data for symbol '{symbol}'; run `download {symbol}` first")]
    NoCachedData { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the prices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Cache,
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataSource::YahooFinance => "yahoo_finance",
            DataSource::CsvImport => "csv_import",
            DataSource::Cache => "cache",
            DataSource::Synthetic => "synthetic",
        };
        f.write_str(name)
    }
}

/// Trait for price providers.
///
/// Implementations only fetch. The cache sits above this trait.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily prices for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Whether the provider currently accepts requests (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-symbol downloads.
pub trait DownloadProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<(), DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits tracing events.
pub struct LogProgress;

impl DownloadProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::info!("[{}/{}] fetching {symbol}", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => tracing::info!(symbol, "download ok"),
            Err(e) => tracing::warn!(symbol, error = %e, "download failed"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "download batch complete");
    }
}
