//! Quant Portfolio - long/short portfolio construction and static-weight backtesting.
//!
//! # Overview
//!
//! Given a cross-section of model predictions, the crate builds an
//! equal-weight long/short book, caps every position and renormalizes each
//! side to unit gross exposure. A weight vector can then be evaluated against
//! historical prices: per-ticker simple returns are joined on date, summed
//! with the fixed weights and compounded into an equity curve.
//!
//! - **Construction**: stable ranking, top/bottom windows, per-name cap, side renormalization
//! - **Backtesting**: inner or union date alignment, missing tickers excluded and reported
//! - **Data**: `Ticker,Prediction`, `Ticker,Weight` and per-ticker price CSVs
//! - **Configuration files**: TOML-based configuration for reproducible runs
//!
//! # Quick Start
//!
//! ```
//! use quant_portfolio::construct::{construct_weights, ConstructConfig};
//! use quant_portfolio::types::PredictionRow;
//!
//! let predictions = vec![
//!     PredictionRow::new("A", 0.9),
//!     PredictionRow::new("B", 0.5),
//!     PredictionRow::new("C", 0.1),
//!     PredictionRow::new("D", -0.3),
//! ];
//! let weights = construct_weights(&predictions, &ConstructConfig::new(2, 2, 1.0)).unwrap();
//!
//! let long: f64 = weights.iter().filter(|w| w.weight > 0.0).map(|w| w.weight).sum();
//! assert!((long - 1.0).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! - [`types`]: Table rows (predictions, weights, prices, backtest output)
//! - [`construct`]: Weight constructor
//! - [`backtest`]: Static-weight backtester
//! - [`data`]: CSV loaders and price sources
//! - [`export`]: CSV and JSON writers
//! - [`analytics`]: Performance summary and terminal reports
//! - [`config`]: TOML configuration file support

pub mod analytics;
pub mod backtest;
pub mod config;
pub mod construct;
pub mod data;
pub mod error;
pub mod export;
pub mod types;

pub use backtest::{AlignPolicy, BacktestConfig, BacktestReport, Backtester};
pub use construct::{construct_weights, ConstructConfig};
pub use data::{CsvDirPriceSource, InMemoryPriceSource, PriceSource};
pub use error::{PortfolioError, Result};
pub use types::{BacktestRow, PredictionRow, PricePoint, WeightRow};
