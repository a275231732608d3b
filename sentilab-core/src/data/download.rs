//! Download orchestrator: fetch → ingest → cache for a list of symbols.

use super::cache::{CoverageResult, ParquetCache};
use super::ingest;
use super::provider::{DataError, DataProvider, DownloadProgress};
use chrono::NaiveDate;

#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped_cached: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Download several symbols. Symbols already covered by the cache are skipped
/// unless `force` is set. Stops early once the provider refuses requests.
pub fn download_symbols(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut summary = DownloadSummary {
        total,
        succeeded: 0,
        skipped_cached: 0,
        errors: Vec::new(),
    };

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        if !force && cache.covers_range(symbol, start, end) == CoverageResult::FullyCovered {
            progress.on_complete(symbol, i, total, &Ok(()));
            summary.succeeded += 1;
            summary.skipped_cached += 1;
            continue;
        }

        let result = download_single(provider, cache, symbol, start, end);
        progress.on_complete(symbol, i, total, &result);
        match result {
            Ok(()) => summary.succeeded += 1,
            Err(e) => summary.errors.push((symbol.to_string(), e)),
        }

        if !provider.is_available() {
            for sym in &symbols[(i + 1)..] {
                summary
                    .errors
                    .push((sym.to_string(), DataError::CircuitBreakerTripped));
            }
            break;
        }
    }

    progress.on_batch_complete(summary.succeeded, summary.failed(), total);
    summary
}

/// Fetch one symbol, validate it and write it to the cache.
pub fn download_single(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), DataError> {
    let fetched = provider.fetch(symbol, start, end)?;
    let ingested = ingest::ingest(fetched.bars)?;
    cache.write(symbol, &ingested.bars, fetched.source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult, LogProgress, RawBar};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        calls: AtomicUsize,
        fail_for: &'static str,
    }

    impl DataProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == self.fail_for {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.into(),
                });
            }
            Ok(FetchResult {
                symbol: symbol.into(),
                bars: vec![RawBar::new(start, 10.0), RawBar::new(start.succ_opt().unwrap(), 11.0)],
                source: DataSource::YahooFinance,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn downloads_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = StubProvider {
            calls: AtomicUsize::new(0),
            fail_for: "NOPE",
        };
        let start = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();

        let summary = download_symbols(
            &provider,
            &cache,
            &["AAPL", "NOPE"],
            start,
            end,
            false,
            &LogProgress,
        );
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(cache.load("AAPL").unwrap().len(), 2);

        // Second run is served from the cache.
        let again = download_symbols(&provider, &cache, &["AAPL"], start, end, false, &LogProgress);
        assert_eq!(again.skipped_cached, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
