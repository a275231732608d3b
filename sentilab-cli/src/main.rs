//! SentiLab CLI: run, download, headlines and cache commands.
//!
//! Commands:
//! - `run`: the sentiment-gated crossover pipeline with backtest and prediction
//! - `download`: fetch prices from Yahoo Finance into the Parquet cache
//! - `headlines`: score a headline file and print the per-date sentiment
//! - `cache status`: report cached symbols, date ranges and sizes
//!
//! Logs go to stderr through `tracing`; stdout carries the report.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sentilab_core::data::{
    download_symbols, CircuitBreaker, DataProvider, LogProgress, ParquetCache, YahooProvider,
};
use sentilab_core::prediction::PredictionOutcome;
use sentilab_core::sentiment::{load_daily_sentiment, VaderScorer};
use sentilab_runner::{
    run_pipeline, save_artifacts, PipelineConfig, PipelineResult, RunOptions, RECORD_COLUMNS,
};

/// Sample rows with an active signal shown at the end of the report.
const SAMPLE_SIGNAL_ROWS: usize = 10;

#[derive(Parser)]
#[command(
    name = "sentilab",
    about = "SentiLab CLI: news-sentiment gated moving-average crossover"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline: averages, sentiment merge, signals, backtest, prediction.
    Run {
        /// Path to a TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ticker symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<String>,

        /// Headline file, one `YYYY-MM-DD text` per line.
        #[arg(long)]
        headlines: Option<PathBuf>,

        /// CSV price file used when the cache and download both fail.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Offline mode: no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use synthetic prices as the last fallback.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Skip the next-close prediction.
        #[arg(long, default_value_t = false)]
        no_predict: bool,

        /// Ignore cached prices and download again.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Do not write artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Download prices from Yahoo Finance and cache them as Parquet.
    Download {
        /// Symbols to download (e.g., AAPL MSFT).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Score a headline file and print mean sentiment per date.
    Headlines {
        /// Headline file, one `YYYY-MM-DD text` per line.
        file: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached symbols, date ranges and sizes.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

/// Flags of `run` that override the config file.
struct RunOverrides {
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    headlines: Option<PathBuf>,
    csv: Option<PathBuf>,
    no_predict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            symbol,
            start,
            end,
            headlines,
            csv,
            offline,
            synthetic,
            no_predict,
            force,
            cache_dir,
            output_dir,
            no_artifacts,
        } => {
            let overrides = RunOverrides {
                symbol,
                start,
                end,
                headlines,
                csv,
                no_predict,
            };
            let options = RunOptions {
                offline,
                synthetic,
                force_download: force,
            };
            let output_dir = (!no_artifacts).then_some(output_dir);
            run_cmd(config, overrides, options, &cache_dir, output_dir.as_deref())
        }
        Commands::Download {
            symbols,
            start,
            end,
            force,
            cache_dir,
        } => run_download(symbols, start, end, force, cache_dir),
        Commands::Headlines { file } => run_headlines(&file),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn build_config(path: Option<PathBuf>, overrides: RunOverrides) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };

    if let Some(symbol) = overrides.symbol {
        config.pipeline.symbol = symbol;
    }
    if let Some(start) = overrides.start.as_deref() {
        config.pipeline.start_date = parse_date(start)?;
    }
    if let Some(end) = overrides.end.as_deref() {
        config.pipeline.end_date = parse_date(end)?;
    }
    if let Some(headlines) = overrides.headlines {
        config.pipeline.headline_file_path = headlines;
    }
    if overrides.csv.is_some() {
        config.data.csv_path = overrides.csv;
    }
    if overrides.no_predict {
        config.prediction.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

fn run_cmd(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
    options: RunOptions,
    cache_dir: &Path,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = build_config(config_path, overrides)?;

    let cache = ParquetCache::new(cache_dir);
    let provider = if options.offline {
        None
    } else {
        let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
        Some(YahooProvider::new(circuit_breaker)?)
    };
    let provider_ref = provider.as_ref().map(|p| p as &dyn DataProvider);

    let result = run_pipeline(&config, &cache, provider_ref, &options)?;

    print_report(&result);

    if let Some(output_dir) = output_dir {
        let run_dir = save_artifacts(&result, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let start_date = start
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365 * 10));

    let end_date = end
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(circuit_breaker)?;
    let cache = ParquetCache::new(cache_dir);

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let summary = download_symbols(
        &provider,
        &cache,
        &sym_refs,
        start_date,
        end_date,
        force,
        &LogProgress,
    );

    println!(
        "Downloaded {}/{} symbols ({} already cached)",
        summary.succeeded, summary.total, summary.skipped_cached
    );
    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_headlines(file: &Path) -> Result<()> {
    let scorer = VaderScorer::new();
    let daily = load_daily_sentiment(file, &scorer)?;

    println!(
        "{} headlines over {} dates",
        daily.headline_count,
        daily.series.len()
    );
    println!();
    println!("{:<12} {:>10}", "Date", "Sentiment");
    println!("{}", "-".repeat(23));
    for (date, score) in daily.series.iter() {
        println!("{:<12} {:>10.4}", date.to_string(), score);
    }

    if !daily.skipped.is_empty() {
        println!();
        println!("Skipped {} line(s):", daily.skipped.len());
        for line in &daily.skipped {
            println!("  line {}: {} ({})", line.line_number, line.content, line.reason);
        }
    }
    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let metas = cache.list()?;
    if metas.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let sizes: Vec<u64> = metas
        .iter()
        .map(|m| dir_size(&cache_dir.join(format!("symbol={}", m.symbol))))
        .collect();

    println!("Cache: {}", cache_dir.display());
    println!("Symbols: {}", metas.len());
    println!("Total size: {}", format_size(sizes.iter().sum()));
    println!();
    println!(
        "{:<8} {:<25} {:<12} {:<10} {:>10}",
        "Symbol", "Date Range", "Bars", "Source", "Size"
    );
    println!("{}", "-".repeat(69));
    for (meta, size) in metas.iter().zip(&sizes) {
        println!(
            "{:<8} {:<25} {:<12} {:<10} {:>10}",
            meta.symbol,
            format!("{} to {}", meta.start_date, meta.end_date),
            format!("{} bars", meta.bar_count),
            meta.source,
            format_size(*size)
        );
    }

    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

fn print_report(result: &PipelineResult) {
    let m = &result.metrics;

    println!();
    println!("=== {} ===", result.config.pipeline.symbol);
    println!("Columns: {}", RECORD_COLUMNS.join(", "));
    println!("Buy signals:  {}", m.buy_signals);
    println!("Sell signals: {}", m.sell_signals);
    println!(
        "Final Cumulative Return with News Sentiment: {:.2}%",
        result.final_cumulative_return() * 100.0
    );

    println!();
    println!("--- Next-Close Prediction ---");
    match &result.prediction {
        PredictionOutcome::Completed(report) => {
            println!("{:<12} {:>12} {:>12}", "Date", "Predicted", "True");
            for p in &report.predictions {
                println!(
                    "{:<12} {:>12.2} {:>12.2}",
                    p.date.to_string(),
                    p.predicted,
                    p.actual
                );
            }
            println!(
                "RMSE {:.4}  MAE {:.4}  R² {:.4}  ({} train / {} test)",
                report.metrics.rmse,
                report.metrics.mae,
                report.metrics.r2,
                report.train_rows,
                report.test_rows
            );
        }
        PredictionOutcome::Skipped { reason } => {
            println!("No valid data available for prediction.");
            tracing::debug!(%reason, "prediction skipped");
        }
    }

    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("CAGR:           {:.2}%", m.cagr * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Sortino:        {:.3}", m.sortino);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Exposure:       {:.1}%", m.exposure * 100.0);
    println!("Trading Days:   {}", m.trading_days);

    if let Some(s) = &result.sentiment_summary {
        println!();
        println!("--- Sentiment ---");
        println!("count  {}", s.count);
        println!("mean   {:.4}", s.mean);
        println!(
            "std    {}",
            s.std.map(|v| format!("{v:.4}")).unwrap_or_else(|| "NaN".into())
        );
        println!("min    {:.4}", s.min);
        println!("25%    {:.4}", s.q25);
        println!("50%    {:.4}", s.median);
        println!("75%    {:.4}", s.q75);
        println!("max    {:.4}", s.max);
    }

    println!();
    println!("--- Sample Signals ---");
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>7}",
        "Date", "Close", "MA Short", "MA Long", "Sentiment", "Signal"
    );
    for r in result.active_signals().take(SAMPLE_SIGNAL_ROWS) {
        println!(
            "{:<12} {:>10.2} {:>10} {:>10} {:>10.4} {:>7}",
            r.date.to_string(),
            r.close,
            fmt_opt(r.ma_short),
            fmt_opt(r.ma_long),
            r.sentiment,
            r.signal.as_i8()
        );
    }

    if result.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    if result.skipped_headlines > 0 {
        println!(
            "WARNING: {} headline line(s) skipped",
            result.skipped_headlines
        );
    }
    println!();
}
