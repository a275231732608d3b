//! CSV price import: the offline fallback when Yahoo is unavailable.
//!
//! Accepts Yahoo's own export format (`Date,Open,High,Low,Close,Adj Close,Volume`)
//! as well as minimal `date,close` files. Extra columns are ignored. Rows that
//! fail to parse are skipped with a warning.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date")]
    date: NaiveDate,
    #[serde(rename = "Close", alias = "close")]
    close: f64,
    #[serde(rename = "Adj Close", alias = "adj_close", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume", alias = "volume", default)]
    volume: Option<f64>,
}

/// Parse price rows from any reader.
pub fn read_price_csv<R: Read>(reader: R) -> Result<Vec<RawBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        match row {
            Ok(row) => bars.push(RawBar {
                date: row.date,
                close: row.close,
                adj_close: row.adj_close,
                volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
            }),
            Err(e) => {
                // Header is line 1, first data row is line 2.
                tracing::warn!(line = i + 2, error = %e, "skipping unparsable price row");
            }
        }
    }

    if bars.is_empty() {
        return Err(DataError::CsvError("no parsable price rows".into()));
    }
    Ok(bars)
}

pub fn read_price_csv_file(path: &Path) -> Result<Vec<RawBar>, DataError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DataError::CsvError(format!("open {}: {e}", path.display())))?;
    read_price_csv(file)
}

/// A provider backed by a single CSV file, usable wherever Yahoo would be.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars: Vec<RawBar> = read_price_csv_file(&self.path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_yahoo_export_format() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                   2020-01-02,296.24,300.60,295.19,300.35,73.15,33870100\n\
                   2020-01-03,297.15,300.58,296.50,297.43,72.44,36580700\n";
        let bars = read_price_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 300.35);
        assert_eq!(bars[0].adj_close, Some(73.15));
        assert_eq!(bars[1].volume, 36580700);
    }

    #[test]
    fn reads_minimal_lowercase_format() {
        let csv = "date,close\n2020-01-02,100\n2020-01-03,101.5\n";
        let bars = read_price_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 101.5);
        assert_eq!(bars[1].adj_close, None);
    }

    #[test]
    fn skips_unparsable_rows() {
        let csv = "date,close\n2020-01-02,null\nnot-a-date,1\n2020-01-06,99\n";
        let bars = read_price_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2020, 1, 6).unwrap());
    }

    #[test]
    fn provider_filters_to_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,close").unwrap();
        writeln!(file, "2019-12-31,90").unwrap();
        writeln!(file, "2020-01-02,100").unwrap();

        let provider = CsvProvider::new(file.path());
        assert!(provider.is_available());
        let fetched = provider
            .fetch(
                "AAPL",
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            )
            .unwrap();
        assert_eq!(fetched.bars.len(), 1);
        assert_eq!(fetched.source, DataSource::CsvImport);
    }
}
