//! Configuration file support.
//!
//! A TOML file describes a construction step, a backtest step, or both, so a
//! run can be reproduced from a single file.

use crate::backtest::{AlignPolicy, BacktestConfig};
use crate::construct::{default_cap_per_name, default_short_n, default_top_n, ConstructConfig};
use crate::data::parse_date;
use crate::error::{PortfolioError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Complete run configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioFileConfig {
    /// Construction settings.
    #[serde(default)]
    pub construct: ConstructSettings,
    /// Backtest settings.
    #[serde(default)]
    pub backtest: BacktestSettings,
}

/// Construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructSettings {
    /// Path to a `Ticker,Prediction` CSV.
    pub predictions: Option<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_short_n")]
    pub short_n: usize,
    #[serde(default = "default_cap_per_name")]
    pub cap_per_name: f64,
    /// Where to write the `Ticker,Weight` CSV.
    pub output: Option<String>,
}

impl Default for ConstructSettings {
    fn default() -> Self {
        Self {
            predictions: None,
            top_n: default_top_n(),
            short_n: default_short_n(),
            cap_per_name: default_cap_per_name(),
            output: None,
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// Path to a `Ticker,Weight` CSV. Falls back to the construction output.
    pub weights: Option<String>,
    /// Directory holding one `<TICKER>.csv` price file per ticker.
    pub prices_dir: Option<String>,
    /// Start date (YYYY-MM-DD format).
    pub start: Option<String>,
    /// End date (YYYY-MM-DD format).
    pub end: Option<String>,
    /// "inner" or "union".
    #[serde(default = "default_align")]
    pub align: String,
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Where to write the `Date,Returns,Equity` CSV.
    pub output: Option<String>,
}

fn default_align() -> String { "inner".to_string() }
fn default_true() -> bool { true }

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            weights: None,
            prices_dir: None,
            start: None,
            end: None,
            align: default_align(),
            parallel: true,
            output: None,
        }
    }
}

impl PortfolioFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: PortfolioFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PortfolioError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validated construction parameters.
    pub fn construct_config(&self) -> Result<ConstructConfig> {
        let config = ConstructConfig::new(
            self.construct.top_n,
            self.construct.short_n,
            self.construct.cap_per_name,
        );
        config.validate()?;
        Ok(config)
    }

    pub fn backtest_config(&self) -> Result<BacktestConfig> {
        Ok(BacktestConfig {
            align: self.backtest.align.parse::<AlignPolicy>()?,
            parallel: self.backtest.parallel,
        })
    }

    /// Backtest window; both ends are required and must be ordered.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = self.backtest.start.as_deref().ok_or_else(|| {
            PortfolioError::ConfigError("No backtest start date specified".to_string())
        })?;
        let end = self.backtest.end.as_deref().ok_or_else(|| {
            PortfolioError::ConfigError("No backtest end date specified".to_string())
        })?;

        let start = parse_date(start, Some("%Y-%m-%d"))?;
        let end = parse_date(end, Some("%Y-%m-%d"))?;
        if start > end {
            return Err(PortfolioError::InvalidArgument(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok((start, end))
    }

    /// Weights path for the backtest step.
    pub fn weights_path(&self) -> Option<&str> {
        self.backtest
            .weights
            .as_deref()
            .or(self.construct.output.as_deref())
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# Portfolio construction and backtest configuration

[construct]
predictions = "predictions.csv"   # columns: Ticker,Prediction
top_n = 5
short_n = 5
cap_per_name = 0.05
output = "weights.csv"

[backtest]
# weights = "weights.csv"         # defaults to construct.output
prices_dir = "prices"             # one <TICKER>.csv per ticker (Date, Close / Adj Close)
start = "2024-01-01"
end = "2024-12-31"
align = "inner"                   # "inner" or "union"
parallel = true
output = "equity.csv"             # columns: Date,Returns,Equity
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = PortfolioFileConfig::default();
        assert_eq!(config.construct.top_n, 5);
        assert_eq!(config.construct.short_n, 5);
        assert!((config.construct.cap_per_name - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.backtest.align, "inner");
    }

    #[test]
    fn test_load_config() {
        let toml_content = r#"
[construct]
predictions = "preds.csv"
top_n = 10
cap_per_name = 0.2

[backtest]
prices_dir = "px"
start = "2023-01-01"
end = "2023-06-30"
align = "union"
"#;
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", toml_content).unwrap();

        let config = PortfolioFileConfig::load(file.path()).unwrap();
        assert_eq!(config.construct.predictions.as_deref(), Some("preds.csv"));
        assert_eq!(config.construct.top_n, 10);
        assert_eq!(config.construct.short_n, 5);

        let construct = config.construct_config().unwrap();
        assert!((construct.cap_per_name - 0.2).abs() < f64::EPSILON);

        let backtest = config.backtest_config().unwrap();
        assert_eq!(backtest.align, AlignPolicy::Union);

        let (start, end) = config.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = PortfolioFileConfig::default();
        config.construct.top_n = 0;
        assert!(config.construct_config().is_err());

        config.backtest.align = "diagonal".to_string();
        assert!(config.backtest_config().is_err());

        config.backtest.start = Some("2024-02-01".to_string());
        config.backtest.end = Some("2024-01-01".to_string());
        assert!(matches!(
            config.date_range(),
            Err(PortfolioError::InvalidArgument(_))
        ));

        config.backtest.end = None;
        assert!(matches!(config.date_range(), Err(PortfolioError::ConfigError(_))));
    }

    #[test]
    fn test_weights_path_falls_back_to_construct_output() {
        let mut config = PortfolioFileConfig::default();
        config.construct.output = Some("w.csv".to_string());
        assert_eq!(config.weights_path(), Some("w.csv"));

        config.backtest.weights = Some("other.csv".to_string());
        assert_eq!(config.weights_path(), Some("other.csv"));
    }

    #[test]
    fn test_save_config() {
        let config = PortfolioFileConfig::default();
        let file = NamedTempFile::new().unwrap();
        config.save(file.path()).unwrap();

        let loaded = PortfolioFileConfig::load(file.path()).unwrap();
        assert_eq!(loaded.construct.top_n, config.construct.top_n);
    }

    #[test]
    fn test_example_config_parses() {
        let example = PortfolioFileConfig::example();
        let config: PortfolioFileConfig = toml::from_str(&example).unwrap();
        assert_eq!(config.weights_path(), Some("weights.csv"));
        assert!(config.date_range().is_ok());
    }
}
