//! Parquet price cache.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/prices.parquet` plus a `meta.json`
//! sidecar describing the cached range.
//!
//! - Writes are atomic (write to `.tmp`, rename into place).
//! - Loads validate the schema and row count; a corrupt file is renamed to
//!   `prices.parquet.quarantined` and reported as missing.

use super::provider::{DataError, DataSource, RawBar};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PRICES_FILE: &str = "prices.parquet";
const META_FILE: &str = "meta.json";
const COLUMNS: [&str; 4] = ["date", "close", "adj_close", "volume"];

/// Metadata sidecar for a cached symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// How well the cache covers a requested date range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

#[derive(Debug, Clone)]
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={symbol}"))
    }

    fn prices_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join(PRICES_FILE)
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join(META_FILE)
    }

    /// Replace the cached prices for `symbol`. Bars must already be ingested
    /// (ascending, unique dates).
    pub fn write(&self, symbol: &str, bars: &[RawBar], source: DataSource) -> Result<(), DataError> {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DataError::CacheError("no bars to cache".into())),
        };

        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut df = bars_to_dataframe(bars)?;
        let path = self.prices_path(symbol);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: first.date,
            end_date: last.date,
            bar_count: bars.len(),
            data_hash: hash_bars(bars),
            source: source.to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        tracing::debug!(symbol, bars = bars.len(), "cached prices");
        Ok(())
    }

    /// Load all cached bars for a symbol, ascending by date.
    pub fn load(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        let path = self.prices_path(symbol);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        match load_and_validate_parquet(&path) {
            Ok(mut bars) => {
                bars.sort_by_key(|b| b.date);
                Ok(bars)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, path.with_extension("parquet.quarantined"));
                Err(DataError::NoCachedData {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    /// Load cached bars restricted to an inclusive date range.
    pub fn load_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let bars: Vec<RawBar> = self
            .load(symbol)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Metadata for every cached symbol, sorted by symbol.
    pub fn list(&self) -> Result<Vec<CacheMeta>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut metas = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(symbol) = name.strip_prefix("symbol=") {
                if let Some(meta) = self.get_meta(symbol) {
                    metas.push(meta);
                }
            }
        }
        metas.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(metas)
    }

    /// Whether the cache covers `[start, end]` for `symbol`.
    ///
    /// Ranges are compared by calendar date, so a requested start on a weekend
    /// counts as covered when the cache begins on the next trading day.
    pub fn covers_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        match self.get_meta(symbol) {
            None => CoverageResult::NotCached,
            Some(meta) => {
                let slack = chrono::Duration::days(4);
                if meta.start_date <= start + slack && meta.end_date + slack >= end {
                    CoverageResult::FullyCovered
                } else {
                    CoverageResult::PartiallyCovered {
                        cached_start: meta.start_date,
                        cached_end: meta.end_date,
                    }
                }
            }
        }
    }
}

/// Deterministic BLAKE3 hash over dates and prices.
pub fn hash_bars(bars: &[RawBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.adj_close.unwrap_or(f64::NAN).to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn bars_to_dataframe(bars: &[RawBar]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch()).num_days() as i32)
        .collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let adj_closes: Vec<Option<f64>> = bars.iter().map(|b| b.adj_close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
        Column::new("adj_close".into(), adj_closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<RawBar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in COLUMNS {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_bars(&df)
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<RawBar>, DataError> {
    let col = |name: &str| {
        df.column(name)
            .map_err(|e| DataError::ParquetError(format!("column read: {e}")))
    };
    let type_err = |name: &str, e: PolarsError| {
        DataError::ParquetError(format!("{name} column type: {e}"))
    };

    let date_ca = col("date")?.date().map_err(|e| type_err("date", e))?;
    let close_ca = col("close")?.f64().map_err(|e| type_err("close", e))?;
    let adj_ca = col("adj_close")?.f64().map_err(|e| type_err("adj_close", e))?;
    let vol_ca = col("volume")?.u64().map_err(|e| type_err("volume", e))?;

    let mut bars = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        let close = close_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null close at row {i}")))?;
        bars.push(RawBar {
            date: epoch() + chrono::Duration::days(i64::from(days)),
            close,
            adj_close: adj_ca.get(i),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bars() -> Vec<RawBar> {
        vec![
            RawBar {
                date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                close: 300.35,
                adj_close: Some(73.15),
                volume: 1000,
            },
            RawBar {
                date: NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
                close: 297.43,
                adj_close: None,
                volume: 1100,
            },
        ]
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());

        cache.write("AAPL", &sample_bars(), DataSource::YahooFinance).unwrap();
        let loaded = cache.load("AAPL").unwrap();

        assert_eq!(loaded, sample_bars());
    }

    #[test]
    fn load_nonexistent_returns_no_cached_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        assert!(matches!(
            cache.load("MSFT"),
            Err(DataError::NoCachedData { .. })
        ));
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("AAPL", &sample_bars(), DataSource::YahooFinance).unwrap();

        let path = cache.prices_path("AAPL");
        fs::write(&path, b"not parquet").unwrap();

        assert!(cache.load("AAPL").is_err());
        assert!(!path.exists());
        assert!(path.with_extension("parquet.quarantined").exists());
    }

    #[test]
    fn meta_describes_cached_range() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("AAPL", &sample_bars(), DataSource::CsvImport).unwrap();

        let meta = cache.get_meta("AAPL").unwrap();
        assert_eq!(meta.bar_count, 2);
        assert_eq!(meta.source, "csv_import");
        assert_eq!(meta.start_date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(meta.data_hash, hash_bars(&sample_bars()));

        let listed = cache.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].symbol, "AAPL");
    }

    #[test]
    fn coverage_check() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("AAPL", &sample_bars(), DataSource::YahooFinance).unwrap();

        // 2020-01-01 is a holiday: the cache starting on the 2nd still covers it.
        assert_eq!(
            cache.covers_range(
                "AAPL",
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 3).unwrap()
            ),
            CoverageResult::FullyCovered
        );
        assert!(matches!(
            cache.covers_range(
                "AAPL",
                NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 3).unwrap()
            ),
            CoverageResult::PartiallyCovered { .. }
        ));
        assert_eq!(
            cache.covers_range("MSFT", NaiveDate::default(), NaiveDate::default()),
            CoverageResult::NotCached
        );
    }

    #[test]
    fn load_range_filters_dates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("AAPL", &sample_bars(), DataSource::YahooFinance).unwrap();

        let d3 = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
        let bars = cache.load_range("AAPL", d3, d3).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d3);
    }
}
