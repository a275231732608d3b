//! Artifact export: JSON, CSV and Markdown.
//!
//! A saved run directory holds:
//! - `manifest.json`: run id, config, provenance, metrics and summaries
//! - `result.json`: the full `PipelineResult`, reloadable with `load_artifacts`
//! - `records.csv`: the daily record table, empty cells for undefined values
//! - `predictions.csv`: held-out predictions, only when prediction ran
//! - `report.md`: human-readable summary
//!
//! Persisted JSON carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sentilab_core::data::DataSource;
use sentilab_core::domain::DailyRecord;
use sentilab_core::pipeline::MergeStats;
use sentilab_core::prediction::{
    HeldOutPrediction, PredictionOutcome, RegressionMetrics, FEATURE_NAMES,
};

use crate::config::{PipelineConfig, RunId};
use crate::metrics::{ColumnSummary, PerformanceMetrics};
use crate::runner::{PipelineResult, SCHEMA_VERSION};

/// Column order of `records.csv`.
pub const RECORD_COLUMNS: [&str; 8] = [
    "date",
    "close",
    "ma_short",
    "ma_long",
    "sentiment",
    "signal",
    "strategy_return",
    "cumulative_return",
];

/// Length of the run-id prefix used as the artifact directory name.
pub const RUN_DIR_PREFIX_LEN: usize = 12;

// ─── Manifest ───────────────────────────────────────────────────────

/// Prediction stage summary without the per-row predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionSummary {
    Skipped {
        reason: String,
    },
    Completed {
        features: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
        metrics: RegressionMetrics,
        train_rows: usize,
        test_rows: usize,
    },
}

impl From<&PredictionOutcome> for PredictionSummary {
    fn from(outcome: &PredictionOutcome) -> Self {
        match outcome {
            PredictionOutcome::Skipped { reason } => Self::Skipped {
                reason: reason.clone(),
            },
            PredictionOutcome::Completed(report) => Self::Completed {
                features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                coefficients: report.model.coefficients.clone(),
                intercept: report.model.intercept,
                metrics: report.metrics,
                train_rows: report.train_rows,
                test_rows: report.test_rows,
            },
        }
    }
}

/// Small, stable description of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: PipelineConfig,
    pub dataset_hash: String,
    pub data_source: DataSource,
    pub rows: usize,
    pub merge: MergeStats,
    pub metrics: PerformanceMetrics,
    pub final_cumulative_return: f64,
    pub sentiment_summary: Option<ColumnSummary>,
    pub prediction: PredictionSummary,
    pub headline_count: usize,
    pub skipped_headlines: usize,
    pub completed_at: DateTime<Utc>,
}

impl RunManifest {
    pub fn from_result(result: &PipelineResult) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            config: result.config.clone(),
            dataset_hash: result.dataset_hash.clone(),
            data_source: result.data_source,
            rows: result.records.len(),
            merge: result.merge,
            metrics: result.metrics.clone(),
            final_cumulative_return: result.final_cumulative_return(),
            sentiment_summary: result.sentiment_summary.clone(),
            prediction: PredictionSummary::from(&result.prediction),
            headline_count: result.headline_count,
            skipped_headlines: result.skipped_headlines,
            completed_at: result.completed_at,
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `PipelineResult` to pretty JSON.
pub fn export_json(result: &PipelineResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize PipelineResult to JSON")
}

/// Deserialize a `PipelineResult`, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<PipelineResult> {
    let result: PipelineResult =
        serde_json::from_str(json).context("failed to deserialize PipelineResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Export the record table with `RECORD_COLUMNS` as header. Undefined values
/// are empty cells.
pub fn export_records_csv(records: &[DailyRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(RECORD_COLUMNS)?;

    for r in records {
        wtr.write_record([
            &r.date.to_string(),
            &format!("{:.6}", r.close),
            &opt_cell(r.ma_short),
            &opt_cell(r.ma_long),
            &format!("{:.6}", r.sentiment),
            &r.signal.as_i8().to_string(),
            &opt_cell(r.strategy_return),
            &format!("{:.6}", r.cumulative_return),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export held-out predictions with their error.
pub fn export_predictions_csv(predictions: &[HeldOutPrediction]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "predicted", "actual", "error"])?;
    for p in predictions {
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.6}", p.predicted),
            &format!("{:.6}", p.actual),
            &format!("{:.6}", p.predicted - p.actual),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory a run's artifacts go to: `{output_dir}/{run_id[..12]}`.
pub fn run_dir(result: &PipelineResult, output_dir: &Path) -> PathBuf {
    let prefix: String = result.run_id.chars().take(RUN_DIR_PREFIX_LEN).collect();
    output_dir.join(prefix)
}

/// Save the full artifact set for a run. Returns the run directory.
///
/// Re-running an identical config overwrites the same directory.
pub fn save_artifacts(result: &PipelineResult, output_dir: &Path) -> Result<PathBuf> {
    let dir = run_dir(result, output_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;

    let manifest = serde_json::to_string_pretty(&RunManifest::from_result(result))
        .context("failed to serialize run manifest")?;
    std::fs::write(dir.join("manifest.json"), manifest)?;

    std::fs::write(dir.join("result.json"), export_json(result)?)?;
    std::fs::write(dir.join("records.csv"), export_records_csv(&result.records)?)?;

    let predictions_path = dir.join("predictions.csv");
    match result.prediction.report() {
        Some(report) => {
            std::fs::write(&predictions_path, export_predictions_csv(&report.predictions)?)?;
        }
        None if predictions_path.exists() => {
            std::fs::remove_file(&predictions_path).with_context(|| {
                format!("failed to remove stale {}", predictions_path.display())
            })?;
        }
        None => {}
    }

    std::fs::write(dir.join("report.md"), generate_report(result))?;

    tracing::info!(dir = %dir.display(), "saved run artifacts");
    Ok(dir)
}

/// Load a `PipelineResult` from a run directory written by `save_artifacts`.
pub fn load_artifacts(dir: &Path) -> Result<PipelineResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Load only the manifest of a run directory.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: RunManifest =
        serde_json::from_str(&json).context("failed to deserialize run manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one run.
pub fn generate_report(result: &PipelineResult) -> String {
    let mut md = String::with_capacity(2048);
    let cfg = &result.config;

    md.push_str("# Sentiment Crossover Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", cfg.pipeline.symbol));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        cfg.pipeline.start_date, cfg.pipeline.end_date
    ));
    md.push_str(&format!(
        "| Moving Averages | {} / {} |\n",
        cfg.moving_average.short_window, cfg.moving_average.long_window
    ));
    md.push_str(&format!("| Rows | {} |\n", result.records.len()));
    md.push_str(&format!("| Data Source | {} |\n", result.data_source));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!(
        "| Headlines | {} ({} skipped) |\n",
        result.headline_count, result.skipped_headlines
    ));
    md.push_str(&format!(
        "| Sentiment Days | {} matched, {} unmatched |\n",
        result.merge.matched, result.merge.unmatched_sentiment
    ));
    if result.is_synthetic() {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Final Cumulative Return | {:.2}% |\n",
        result.final_cumulative_return() * 100.0
    ));
    md.push_str(&format!("| CAGR | {:.2}% |\n", m.cagr * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe));
    md.push_str(&format!("| Sortino | {:.3} |\n", m.sortino));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Exposure | {:.1}% |\n", m.exposure * 100.0));
    md.push_str(&format!(
        "| Signals | {} buy / {} sell |\n",
        m.buy_signals, m.sell_signals
    ));
    md.push('\n');

    md.push_str("## Next-Close Prediction\n\n");
    match result.prediction.report() {
        Some(report) => {
            md.push_str("| Feature | Coefficient |\n");
            md.push_str("| --- | --- |\n");
            for (name, coef) in FEATURE_NAMES.iter().zip(&report.model.coefficients) {
                md.push_str(&format!("| {name} | {coef:.6} |\n"));
            }
            md.push_str(&format!("| intercept | {:.6} |\n\n", report.model.intercept));
            let rm = &report.metrics;
            md.push_str(&format!(
                "Held out {} of {} rows: RMSE {:.4}, MAE {:.4}, R² {:.4}\n\n",
                report.test_rows,
                report.train_rows + report.test_rows,
                rm.rmse,
                rm.mae,
                rm.r2
            ));
        }
        None => md.push_str("No valid data available for prediction.\n\n"),
    }

    if let Some(s) = &result.sentiment_summary {
        md.push_str("## Sentiment\n\n");
        md.push_str("| count | mean | std | min | 25% | 50% | 75% | max |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- |\n");
        md.push_str(&format!(
            "| {} | {:.4} | {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |\n\n",
            s.count,
            s.mean,
            s.std.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into()),
            s.min,
            s.q25,
            s.median,
            s.q75,
            s.max
        ));
    }

    md
}
