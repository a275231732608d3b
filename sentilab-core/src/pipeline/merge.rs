//! Merge stage: left join of daily sentiment onto the record table.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::DailyRecord;
use crate::sentiment::SentimentSeries;

/// What the join matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Price rows that received a sentiment value.
    pub matched: usize,
    /// Price rows left at neutral 0.0.
    pub neutral: usize,
    /// Sentiment dates with no price row (weekends, holidays, out of range).
    pub unmatched_sentiment: usize,
}

/// Every price row is kept; rows without a sentiment entry get 0.0.
pub fn merge_sentiment(records: &mut [DailyRecord], sentiment: &SentimentSeries) -> MergeStats {
    let mut stats = MergeStats::default();

    for record in records.iter_mut() {
        match sentiment.get(record.date) {
            Some(score) => {
                record.sentiment = score;
                stats.matched += 1;
            }
            None => {
                record.sentiment = 0.0;
                stats.neutral += 1;
            }
        }
    }
    let price_dates: HashSet<NaiveDate> = records.iter().map(|r| r.date).collect();
    stats.unmatched_sentiment = sentiment
        .dates()
        .filter(|d| !price_dates.contains(d))
        .count();

    tracing::debug!(
        matched = stats.matched,
        neutral = stats.neutral,
        unmatched = stats.unmatched_sentiment,
        "merged sentiment"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    #[test]
    fn left_join_defaults_to_neutral() {
        let mut recs = vec![
            DailyRecord::new(d(16), 100.0),
            DailyRecord::new(d(17), 101.0),
            DailyRecord::new(d(18), 102.0),
        ];
        let series: SentimentSeries = [(d(15), 0.9), (d(17), -0.3)].into_iter().collect();

        let stats = merge_sentiment(&mut recs, &series);

        assert_eq!(recs.len(), 3);
        assert_eq!(
            recs.iter().map(|r| r.sentiment).collect::<Vec<_>>(),
            vec![0.0, -0.3, 0.0]
        );
        assert_eq!(
            stats,
            MergeStats {
                matched: 1,
                neutral: 2,
                unmatched_sentiment: 1
            }
        );
    }

    #[test]
    fn repeated_price_dates_each_receive_sentiment() {
        let mut recs = vec![
            DailyRecord::new(d(16), 100.0),
            DailyRecord::new(d(16), 100.5),
        ];
        let series: SentimentSeries = [(d(16), 0.4)].into_iter().collect();

        let stats = merge_sentiment(&mut recs, &series);

        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.sentiment == 0.4));
        assert_eq!(
            stats,
            MergeStats {
                matched: 2,
                neutral: 0,
                unmatched_sentiment: 0
            }
        );
    }

    #[test]
    fn empty_inputs() {
        let mut recs: Vec<DailyRecord> = Vec::new();
        let series: SentimentSeries = [(d(15), 0.9)].into_iter().collect();
        let stats = merge_sentiment(&mut recs, &series);
        assert!(recs.is_empty());
        assert_eq!(stats.unmatched_sentiment, 1);

        let mut recs = vec![DailyRecord::new(d(16), 100.0)];
        merge_sentiment(&mut recs, &SentimentSeries::new());
        assert_eq!(recs[0].sentiment, 0.0);
    }
}
