//! SentiLab Core: price data, headline sentiment, indicators, pipeline stages, prediction.
//!
//! This crate contains everything the pipeline computes:
//! - Domain types (daily records, trade signals)
//! - Price providers (Yahoo Finance, CSV import) and the Parquet price cache
//! - Headline parsing, polarity scoring and per-date aggregation
//! - Trailing-window indicators
//! - The four pipeline stages: moving averages, sentiment merge, signal, backtest
//! - Next-day close prediction (feature preparation, seeded split, OLS)

pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;
pub mod prediction;
pub mod sentiment;
