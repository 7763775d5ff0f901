//! Error types for portfolio construction and backtesting.

use thiserror::Error;

/// Main error type for the crate.
///
/// Missing price data is deliberately absent from this enum: it degrades the
/// effective universe and is reported on [`crate::backtest::BacktestReport`].
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;
