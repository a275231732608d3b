//! Serializable pipeline configuration.
//!
//! One TOML document with four sections. Every field has a default, so an
//! empty file (or no file at all) reproduces the stock AAPL 2020 to 2022 run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use sentilab_core::pipeline::Windows;
use sentilab_core::prediction::PredictionParams;

/// Unique identifier for a run (content-addressable hash of the config).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub symbol: String,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub headline_file_path: PathBuf,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            symbol: "AAPL".into(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            headline_file_path: PathBuf::from("news_headlines.txt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageSection {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MovingAverageSection {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionSection {
    pub enabled: bool,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PredictionSection {
    fn default() -> Self {
        Self {
            enabled: true,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Use the split/dividend adjusted close when the source has one.
    pub adjusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            adjusted: true,
            csv_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pipeline: PipelineSection,
    pub moving_average: MovingAverageSection,
    pub prediction: PredictionSection,
    pub data: DataSection,
}

impl PipelineConfig {
    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if p.end_date <= p.start_date {
            return Err(ConfigError::Invalid(format!(
                "end_date {} must be after start_date {}",
                p.end_date, p.start_date
            )));
        }

        let ma = &self.moving_average;
        if ma.short_window == 0 || ma.long_window == 0 {
            return Err(ConfigError::Invalid("moving average windows must be >= 1".into()));
        }
        if ma.short_window >= ma.long_window {
            return Err(ConfigError::Invalid(format!(
                "short_window ({}) must be less than long_window ({})",
                ma.short_window, ma.long_window
            )));
        }

        let fraction = self.prediction.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_fraction must be in (0, 1), got {fraction}"
            )));
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId and an artifact
    /// directory.
    pub fn run_id(&self) -> RunId {
        // Serializing plain structs of strings, numbers and dates cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn windows(&self) -> Windows {
        Windows {
            short: self.moving_average.short_window,
            long: self.moving_average.long_window,
        }
    }

    pub fn prediction_params(&self) -> PredictionParams {
        PredictionParams {
            test_fraction: self.prediction.test_fraction,
            seed: self.prediction.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.pipeline.symbol, "AAPL");
        assert_eq!(config.moving_average.short_window, 50);
        assert_eq!(config.moving_average.long_window, 200);
        assert_eq!(config.prediction.seed, 42);
        assert!(config.data.adjusted);
        assert!(config.data.csv_path.is_none());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
[pipeline]
symbol = "MSFT"
start_date = "2019-01-01"

[moving_average]
short_window = 20

[data]
csv_path = "msft.csv"
"#,
        )
        .unwrap();
        assert_eq!(config.pipeline.symbol, "MSFT");
        assert_eq!(config.pipeline.end_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(config.windows(), Windows { short: 20, long: 200 });
        assert_eq!(config.data.csv_path, Some(PathBuf::from("msft.csv")));
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            "[pipeline]\nsymbol = \"  \"",
            "[pipeline]\nstart_date = \"2023-01-01\"\nend_date = \"2020-01-01\"",
            "[moving_average]\nshort_window = 200\nlong_window = 50",
            "[moving_average]\nshort_window = 0",
            "[prediction]\ntest_fraction = 1.0",
            "[prediction]\ntest_fraction = 0.0",
        ];
        for case in cases {
            assert!(
                matches!(PipelineConfig::from_toml(case), Err(ConfigError::Invalid(_))),
                "accepted: {case}"
            );
        }
        assert!(matches!(
            PipelineConfig::from_toml("[pipeline]\nstart_date = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = PipelineConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);

        b.moving_average.short_window = 20;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = PipelineConfig::default();
        config.data.csv_path = Some(PathBuf::from("prices.csv"));
        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_names_path() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/sentilab.toml")).unwrap_err();
        assert!(err.to_string().contains("sentilab.toml"));
    }
}
