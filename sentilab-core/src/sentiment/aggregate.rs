//! Per-date sentiment aggregation.
//!
//! Several headlines can share a date; their polarities are averaged so the
//! merge stage always joins against exactly one value per date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::headlines::{read_headline_file, Headline, SkippedLine};
use super::scorer::PolarityScorer;
use super::SentimentError;

/// One polarity per date, ascending. Dates are unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSeries {
    scores: BTreeMap<NaiveDate, f64>,
}

impl SentimentSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.scores.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.scores.iter().map(|(d, s)| (*d, *s))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.scores.keys().copied()
    }
}

impl FromIterator<(NaiveDate, f64)> for SentimentSeries {
    /// Builds a series from already aggregated pairs. A repeated date keeps
    /// the last value; use [`aggregate_daily`] to average raw headline scores.
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Score every headline and average the scores per date.
pub fn aggregate_daily(headlines: &[Headline], scorer: &dyn PolarityScorer) -> SentimentSeries {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for headline in headlines {
        let entry = sums.entry(headline.date).or_insert((0.0, 0));
        entry.0 += scorer.polarity(&headline.text);
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(date, (sum, n))| (date, sum / n as f64))
        .collect()
}

/// Output of the sentiment aggregator for one headline file.
#[derive(Debug, Clone)]
pub struct DailySentiment {
    pub series: SentimentSeries,
    pub headline_count: usize,
    pub skipped: Vec<SkippedLine>,
}

/// Read a headline file, score it and aggregate per date.
pub fn load_daily_sentiment(
    path: &Path,
    scorer: &dyn PolarityScorer,
) -> Result<DailySentiment, SentimentError> {
    let parsed = read_headline_file(path)?;
    let series = aggregate_daily(&parsed.headlines, scorer);
    tracing::info!(
        headlines = parsed.headlines.len(),
        dates = series.len(),
        skipped = parsed.skipped.len(),
        "aggregated headline sentiment"
    );
    Ok(DailySentiment {
        series,
        headline_count: parsed.headlines.len(),
        skipped: parsed.skipped,
    })
}
