//! Price data: providers, ingest validation and the Parquet cache.

pub mod cache;
pub mod circuit_breaker;
pub mod csv_import;
pub mod download;
pub mod ingest;
pub mod provider;
pub mod yahoo;

pub use cache::{hash_bars, CacheMeta, CoverageResult, ParquetCache};
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::{read_price_csv, read_price_csv_file, CsvProvider};
pub use download::{download_single, download_symbols, DownloadSummary};
pub use ingest::{ingest, ingest_range, IngestResult};
pub use provider::{
    DataError, DataProvider, DataSource, DownloadProgress, FetchResult, LogProgress, RawBar,
};
pub use yahoo::YahooProvider;
