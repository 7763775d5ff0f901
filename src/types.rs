//! Core data types shared by the constructor and the backtester.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A model's scalar prediction for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    #[serde(rename = "Ticker", alias = "ticker", alias = "TICKER", alias = "Symbol", alias = "symbol")]
    pub ticker: String,
    #[serde(rename = "Prediction", alias = "prediction", alias = "PREDICTION", alias = "Score", alias = "score")]
    pub prediction: f64,
}

impl PredictionRow {
    pub fn new(ticker: impl Into<String>, prediction: f64) -> Self {
        Self {
            ticker: ticker.into(),
            prediction,
        }
    }
}

/// Signed portfolio weight for one ticker.
///
/// Positive weights are long exposure, negative weights are short exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRow {
    #[serde(rename = "Ticker", alias = "ticker", alias = "TICKER", alias = "Symbol", alias = "symbol")]
    pub ticker: String,
    #[serde(rename = "Weight", alias = "weight", alias = "WEIGHT")]
    pub weight: f64,
}

impl WeightRow {
    pub fn new(ticker: impl Into<String>, weight: f64) -> Self {
        Self {
            ticker: ticker.into(),
            weight,
        }
    }

    /// Side of the book this row belongs to, `None` for a zero weight.
    pub fn side(&self) -> Option<Side> {
        if self.weight > 0.0 {
            Some(Side::Long)
        } else if self.weight < 0.0 {
            Some(Side::Short)
        } else {
            None
        }
    }
}

/// Book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// A single dated price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    /// A price is usable as a return denominator only if it is finite and positive.
    pub fn validate(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Date-ascending price history of one ticker.
pub type PriceSeries = Vec<PricePoint>;

/// One row of a backtest: the portfolio return for a date and the
/// compounded equity after applying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    #[serde(rename = "Date", alias = "date")]
    pub date: NaiveDate,
    #[serde(rename = "Returns", alias = "returns", alias = "portfolio_return")]
    pub portfolio_return: f64,
    #[serde(rename = "Equity", alias = "equity")]
    pub equity: f64,
}
