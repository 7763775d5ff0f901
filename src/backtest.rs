//! Static-weight backtesting over historical prices.
//!
//! A fixed weight vector is applied to simple per-period returns of each
//! ticker. Returns are joined on the date key, aggregated as a weighted sum
//! and compounded into an equity curve starting from 1.0.
//!
//! # Alignment
//!
//! [`AlignPolicy::Inner`] (the default) keeps a date only when every
//! contributing ticker has a return on it. [`AlignPolicy::Union`] keeps any
//! date on which at least one ticker has a return and sums over the tickers
//! present. Missing observations are never filled, and surviving weights are
//! never rescaled.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use quant_portfolio::backtest::Backtester;
//! use quant_portfolio::types::{PricePoint, WeightRow};
//! use std::collections::HashMap;
//!
//! let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let d2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
//! let mut prices = HashMap::new();
//! prices.insert("A".to_string(), vec![PricePoint::new(d1, 100.0), PricePoint::new(d2, 110.0)]);
//! prices.insert("B".to_string(), vec![PricePoint::new(d1, 50.0), PricePoint::new(d2, 45.0)]);
//!
//! let weights = vec![WeightRow::new("A", 0.6), WeightRow::new("B", 0.4)];
//! let report = Backtester::default().run(&weights, &prices, d1, d2).unwrap();
//!
//! assert_eq!(report.rows.len(), 1);
//! assert!((report.rows[0].portfolio_return - 0.02).abs() < 1e-12);
//! assert!((report.rows[0].equity - 1.02).abs() < 1e-12);
//! ```

use crate::data::{slice_window, PriceSource};
use crate::error::{PortfolioError, Result};
use crate::types::{BacktestRow, PricePoint, PriceSeries, WeightRow};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// How per-ticker return series are joined on the date axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignPolicy {
    /// Only dates on which every contributing ticker has a return.
    #[default]
    Inner,
    /// Any date with at least one return; absent tickers drop out of that date's sum.
    Union,
}

impl fmt::Display for AlignPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignPolicy::Inner => write!(f, "inner"),
            AlignPolicy::Union => write!(f, "union"),
        }
    }
}

impl FromStr for AlignPolicy {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(AlignPolicy::Inner),
            "union" | "outer" => Ok(AlignPolicy::Union),
            other => Err(PortfolioError::ConfigError(format!(
                "Unknown alignment policy: {}",
                other
            ))),
        }
    }
}

/// Backtester settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub align: AlignPolicy,
    /// Compute per-ticker returns on the rayon pool.
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            align: AlignPolicy::Inner,
            parallel: true,
        }
    }
}

/// Why a weighted ticker did not contribute to the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// The price source returned nothing for the ticker.
    NoPriceData,
    /// Fewer than two usable prices inside the window.
    InsufficientHistory,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::NoPriceData => write!(f, "no price data"),
            ExclusionReason::InsufficientHistory => write!(f, "insufficient history"),
        }
    }
}

/// A weighted ticker left out of the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedTicker {
    pub ticker: String,
    pub weight: f64,
    pub reason: ExclusionReason,
}

/// Outcome of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// One row per included date, ascending.
    pub rows: Vec<BacktestRow>,
    /// Tickers that contributed at least one return, in weight order.
    pub tickers: Vec<String>,
    /// Weighted tickers that contributed nothing.
    pub excluded: Vec<ExcludedTicker>,
    pub policy: AlignPolicy,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BacktestReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Equity after the last included date, 1.0 for an empty result.
    pub fn final_equity(&self) -> f64 {
        self.rows.last().map(|r| r.equity).unwrap_or(1.0)
    }

    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.portfolio_return).collect()
    }
}

/// Simple returns `p[t] / p[t-1] - 1` of a date-ascending series.
///
/// The first observation has no return. A pair where either price is not a
/// finite positive number produces no return for that date.
pub fn simple_returns(series: &[PricePoint]) -> Vec<(NaiveDate, f64)> {
    series
        .windows(2)
        .filter(|pair| pair[0].validate() && pair[1].validate())
        .map(|pair| (pair[1].date, pair[1].price / pair[0].price - 1.0))
        .collect()
}

/// Compound a return series into an equity curve starting at 1.0.
pub fn compound(returns: &[(NaiveDate, f64)]) -> Vec<BacktestRow> {
    let mut equity = 1.0;
    returns
        .iter()
        .map(|&(date, r)| {
            equity *= 1.0 + r;
            BacktestRow {
                date,
                portfolio_return: r,
                equity,
            }
        })
        .collect()
}

/// Sum duplicate tickers into one exposure, keeping first-appearance order.
fn net_weights(weights: &[WeightRow]) -> Vec<(String, f64)> {
    let mut order: Vec<(String, f64)> = Vec::with_capacity(weights.len());
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in weights {
        match index.get(row.ticker.as_str()) {
            Some(&i) => {
                warn!(
                    "Ticker {} appears more than once in weights, netting {:.4} into {:.4}",
                    row.ticker, row.weight, order[i].1
                );
                order[i].1 += row.weight;
            }
            None => {
                index.insert(row.ticker.as_str(), order.len());
                order.push((row.ticker.clone(), row.weight));
            }
        }
    }
    order
}

enum TickerReturns {
    Included(Vec<(NaiveDate, f64)>),
    Excluded(ExclusionReason),
}

fn ticker_returns(
    series: Option<&PriceSeries>,
    start: NaiveDate,
    end: NaiveDate,
) -> TickerReturns {
    let Some(series) = series else {
        return TickerReturns::Excluded(ExclusionReason::NoPriceData);
    };

    let mut window = slice_window(series, start, end);
    // Stable sort, so the first observation of a repeated date survives.
    window.sort_by_key(|p| p.date);
    window.dedup_by_key(|p| p.date);

    let returns = simple_returns(&window);
    if returns.is_empty() {
        TickerReturns::Excluded(ExclusionReason::InsufficientHistory)
    } else {
        TickerReturns::Included(returns)
    }
}

/// Static-weight backtester.
#[derive(Debug, Clone, Default)]
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the backtest over `[start, end]`.
    ///
    /// Tickers without usable prices are excluded and reported, never fatal.
    /// When nothing contributes the report has no rows.
    pub fn run(
        &self,
        weights: &[WeightRow],
        prices: &HashMap<String, PriceSeries>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestReport> {
        if start > end {
            return Err(PortfolioError::InvalidArgument(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let netted = net_weights(weights);
        info!(
            "Backtesting {} tickers from {} to {} ({} alignment)",
            netted.len(),
            start,
            end,
            self.config.align
        );

        // Indexed collect keeps weight order regardless of scheduling.
        let per_ticker: Vec<TickerReturns> = if self.config.parallel {
            netted
                .par_iter()
                .map(|(ticker, _)| ticker_returns(prices.get(ticker), start, end))
                .collect()
        } else {
            netted
                .iter()
                .map(|(ticker, _)| ticker_returns(prices.get(ticker), start, end))
                .collect()
        };

        let mut tickers = Vec::new();
        let mut excluded = Vec::new();
        // date -> (weighted sum, contributing ticker count)
        let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

        for ((ticker, weight), outcome) in netted.into_iter().zip(per_ticker) {
            match outcome {
                TickerReturns::Included(returns) => {
                    debug!("{}: {} returns, weight {:.4}", ticker, returns.len(), weight);
                    for (date, r) in returns {
                        let entry = by_date.entry(date).or_insert((0.0, 0));
                        entry.0 += weight * r;
                        entry.1 += 1;
                    }
                    tickers.push(ticker);
                }
                TickerReturns::Excluded(reason) => {
                    warn!("Excluding {} (weight {:.4}): {}", ticker, weight, reason);
                    excluded.push(ExcludedTicker {
                        ticker,
                        weight,
                        reason,
                    });
                }
            }
        }

        let required = match self.config.align {
            AlignPolicy::Inner => tickers.len(),
            AlignPolicy::Union => 1,
        };

        let portfolio_returns: Vec<(NaiveDate, f64)> = by_date
            .into_iter()
            .filter(|(_, (_, count))| *count >= required)
            .map(|(date, (sum, _))| (date, sum))
            .collect();

        let rows = compound(&portfolio_returns);

        if !excluded.is_empty() {
            warn!(
                "{} of {} weighted tickers excluded from the backtest",
                excluded.len(),
                tickers.len() + excluded.len()
            );
        }
        info!(
            "Backtest produced {} rows, final equity {:.4}",
            rows.len(),
            rows.last().map(|r| r.equity).unwrap_or(1.0)
        );

        Ok(BacktestReport {
            rows,
            tickers,
            excluded,
            policy: self.config.align,
            start,
            end,
        })
    }

    /// Fetch prices from `source`, then [`run`](Self::run).
    pub fn run_with_source(
        &self,
        weights: &[WeightRow],
        source: &dyn PriceSource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestReport> {
        if start > end {
            return Err(PortfolioError::InvalidArgument(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let mut seen = HashSet::new();
        let tickers: Vec<String> = weights
            .iter()
            .filter(|w| seen.insert(w.ticker.as_str()))
            .map(|w| w.ticker.clone())
            .collect();
        let prices = source.get_prices(&tickers, start, end)?;
        self.run(weights, &prices, start, end)
    }
}
