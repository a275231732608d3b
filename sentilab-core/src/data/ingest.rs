//! Ingest validation: turns provider output into a clean, strictly ascending
//! price series.
//!
//! Rules, applied in order:
//! 1. rows outside `[start, end]` are dropped (when a range is given);
//! 2. rows whose close is not finite or not positive are dropped; a bad
//!    adjusted close is cleared instead, so adjusted mode falls back to close;
//! 3. rows are sorted by date;
//! 4. duplicate dates keep the last row seen.
//!
//! Every dropped row is counted and reported with `tracing::warn!`.

use super::provider::{DataError, RawBar};
use chrono::NaiveDate;

/// Clean bars plus counts of what was removed.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub bars: Vec<RawBar>,
    pub out_of_range: usize,
    pub invalid_price: usize,
    pub duplicate_dates: usize,
}

impl IngestResult {
    pub fn dropped(&self) -> usize {
        self.out_of_range + self.invalid_price + self.duplicate_dates
    }
}

pub fn ingest(bars: Vec<RawBar>) -> Result<IngestResult, DataError> {
    ingest_range(bars, None)
}

/// Validate bars, keeping only dates inside the inclusive `range`.
pub fn ingest_range(
    bars: Vec<RawBar>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<IngestResult, DataError> {
    if bars.is_empty() {
        return Err(DataError::ValidationError("no bars to ingest".into()));
    }

    let mut out_of_range = 0;
    let mut invalid_price = 0;
    let mut kept: Vec<RawBar> = Vec::with_capacity(bars.len());

    for mut bar in bars {
        if let Some((start, end)) = range {
            if bar.date < start || bar.date > end {
                out_of_range += 1;
                continue;
            }
        }
        if !bar.close.is_finite() || bar.close <= 0.0 {
            tracing::warn!(date = %bar.date, close = bar.close, "dropping row with invalid close");
            invalid_price += 1;
            continue;
        }
        if matches!(bar.adj_close, Some(adj) if !adj.is_finite() || adj <= 0.0) {
            tracing::warn!(date = %bar.date, "clearing invalid adjusted close");
            bar.adj_close = None;
        }
        kept.push(bar);
    }

    // Stable sort keeps input order among equal dates, so "last wins" below
    // means last in the provider's output.
    kept.sort_by_key(|b| b.date);

    let mut deduped: Vec<RawBar> = Vec::with_capacity(kept.len());
    let mut duplicate_dates = 0;
    for bar in kept {
        match deduped.last_mut() {
            Some(prev) if prev.date == bar.date => {
                tracing::warn!(date = %bar.date, "duplicate date in price data, keeping last row");
                *prev = bar;
                duplicate_dates += 1;
            }
            _ => deduped.push(bar),
        }
    }

    if deduped.is_empty() {
        return Err(DataError::ValidationError(
            "no valid bars left after ingest validation".into(),
        ));
    }

    if out_of_range > 0 {
        tracing::debug!(out_of_range, "dropped rows outside requested range");
    }

    Ok(IngestResult {
        bars: deduped,
        out_of_range,
        invalid_price,
        duplicate_dates,
    })
}
