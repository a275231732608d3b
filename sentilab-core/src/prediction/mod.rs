//! Next-day close prediction.
//!
//! Reads the record table after the signal stage, builds
//! `[close, ma_short, ma_long, sentiment] -> next close` pairs, holds out a
//! seeded random fraction and fits OLS on the rest.

pub mod features;
pub mod linear;
pub mod metrics;
pub mod split;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DailyRecord;

pub use features::{build_dataset, Dataset, FEATURE_NAMES};
pub use linear::LinearModel;
pub use metrics::RegressionMetrics;
pub use split::{train_test_split, SplitIndices};

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("normal equations are singular")]
    SingularMatrix,
}

/// Prediction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionParams {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PredictionParams {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// One held-out row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldOutPrediction {
    /// Date of the feature row.
    pub date: NaiveDate,
    pub predicted: f64,
    /// Close of the following trading day.
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub model: LinearModel,
    pub predictions: Vec<HeldOutPrediction>,
    pub metrics: RegressionMetrics,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    /// Not enough usable rows. Not an error.
    Skipped { reason: String },
    Completed(PredictionReport),
}

impl PredictionOutcome {
    pub fn report(&self) -> Option<&PredictionReport> {
        match self {
            PredictionOutcome::Completed(report) => Some(report),
            PredictionOutcome::Skipped { .. } => None,
        }
    }
}

/// Fit on a seeded training partition and predict the held-out rows.
pub fn predict_next_close(
    records: &[DailyRecord],
    params: PredictionParams,
) -> Result<PredictionOutcome, PredictionError> {
    let dataset = build_dataset(records);
    if dataset.is_empty() {
        tracing::info!("no complete feature rows, skipping prediction");
        return Ok(PredictionOutcome::Skipped {
            reason: "no rows with complete features and a next-day close".into(),
        });
    }

    let split = train_test_split(dataset.len(), params.test_fraction, params.seed);
    if split.train.is_empty() {
        tracing::info!(rows = dataset.len(), "training partition empty, skipping prediction");
        return Ok(PredictionOutcome::Skipped {
            reason: format!("{} usable row(s), none left for training", dataset.len()),
        });
    }

    let train = dataset.select(&split.train);
    let test = dataset.select(&split.test);

    let model = LinearModel::fit(train.x.view(), train.y.view())?;
    let predicted = model.predict(test.x.view())?;
    let metrics = RegressionMetrics::calculate(test.y.view(), predicted.view())
        .ok_or(PredictionError::DimensionMismatch {
            expected: test.len(),
            got: predicted.len(),
        })?;

    let predictions = test
        .dates
        .iter()
        .zip(predicted.iter())
        .zip(test.y.iter())
        .map(|((&date, &predicted), &actual)| HeldOutPrediction {
            date,
            predicted,
            actual,
        })
        .collect();

    tracing::info!(
        train = train.len(),
        test = test.len(),
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "fitted next-close model"
    );

    Ok(PredictionOutcome::Completed(PredictionReport {
        model,
        predictions,
        metrics,
        train_rows: train.len(),
        test_rows: test.len(),
    }))
}
