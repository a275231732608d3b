//! Headline sentiment: parsing, polarity scoring and per-date aggregation.

pub mod aggregate;
pub mod headlines;
pub mod scorer;

use std::path::PathBuf;
use thiserror::Error;

pub use aggregate::{aggregate_daily, load_daily_sentiment, DailySentiment, SentimentSeries};
pub use headlines::{
    parse_headline_line, read_headline_file, read_headlines, Headline, HeadlineParse,
    LineRejection, SkippedLine,
};
pub use scorer::{finance_boost, PolarityScorer, VaderScorer};

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("cannot open headline file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed reading headlines: {0}")]
    Io(#[from] std::io::Error),
}
