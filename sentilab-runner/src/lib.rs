//! SentiLab Runner: configuration, price loading, orchestration, metrics, artifacts.
//!
//! This crate builds on `sentilab-core` to provide:
//! - TOML pipeline configuration with content-addressed run ids
//! - Price loading with cache/download/CSV/synthetic fallback
//! - The end-to-end pipeline run producing a `PipelineResult`
//! - Backtest performance metrics and the sentiment column summary
//! - JSON, CSV and Markdown artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, PipelineConfig, RunId};
pub use data_loader::{generate_synthetic_bars, load_prices, LoadError, LoadOptions, LoadedPrices};
pub use export::{
    export_json, export_predictions_csv, export_records_csv, generate_report, import_json,
    load_artifacts, load_manifest, save_artifacts, PredictionSummary, RunManifest, RECORD_COLUMNS,
};
pub use metrics::{ColumnSummary, PerformanceMetrics};
pub use runner::{
    run_pipeline, run_pipeline_from_data, run_with_scorer, PipelineResult, RunError, RunOptions,
    SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pipeline_result_is_send_sync() {
        assert_send::<PipelineResult>();
        assert_sync::<PipelineResult>();
    }

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
        assert_send::<RunOptions>();
        assert_sync::<RunOptions>();
    }

    #[test]
    fn manifest_is_send_sync() {
        assert_send::<RunManifest>();
        assert_sync::<RunManifest>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
