//! Feature matrix and next-day labels built from the record table.

use chrono::NaiveDate;
use ndarray::{Array1, Array2};

use crate::domain::DailyRecord;

pub const FEATURE_NAMES: [&str; 4] = ["close", "ma_short", "ma_long", "sentiment"];

/// Rows with a complete feature vector and a known next close.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Date of the feature row; the label is the close of the following row.
    pub dates: Vec<NaiveDate>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            dates: indices.iter().map(|&i| self.dates[i]).collect(),
            x: self.x.select(ndarray::Axis(0), indices),
            y: self.y.select(ndarray::Axis(0), indices),
        }
    }
}

fn feature_row(record: &DailyRecord) -> Option<[f64; 4]> {
    Some([
        record.close,
        record.ma_short?,
        record.ma_long?,
        record.sentiment,
    ])
}

/// Pair each row's features with the next row's close.
///
/// The last row has no label and is dropped, as is any row with an
/// undefined moving average.
pub fn build_dataset(records: &[DailyRecord]) -> Dataset {
    let mut dates = Vec::new();
    let mut flat = Vec::new();
    let mut labels = Vec::new();

    for pair in records.windows(2) {
        if let Some(row) = feature_row(&pair[0]) {
            dates.push(pair[0].date);
            flat.extend_from_slice(&row);
            labels.push(pair[1].close);
        }
    }

    let n = dates.len();
    let x = Array2::from_shape_vec((n, FEATURE_NAMES.len()), flat)
        .unwrap_or_else(|_| Array2::zeros((0, FEATURE_NAMES.len())));
    Dataset {
        dates,
        x,
        y: Array1::from(labels),
    }
}
