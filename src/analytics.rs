//! Performance summary and terminal reporting.

use crate::backtest::BacktestReport;
use crate::construct::BookSummary;
use crate::types::{BacktestRow, WeightRow};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};

/// Periods per year used for annualization (daily bars).
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Summary statistics of a backtest's return series and equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub periods: usize,
    pub total_return_pct: f64,
    pub annual_return_pct: f64,
    pub volatility_annual_pct: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline of equity, measured from the 1.0 start.
    pub max_drawdown_pct: f64,
    pub best_period_pct: f64,
    pub worst_period_pct: f64,
}

impl PerformanceSummary {
    pub fn from_rows(rows: &[BacktestRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        let returns: Vec<f64> = rows.iter().map(|r| r.portfolio_return).collect();
        let n = returns.len() as f64;
        let final_equity = rows.last().map(|r| r.equity).unwrap_or(1.0);

        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let annual_return = if final_equity > 0.0 {
            final_equity.powf(PERIODS_PER_YEAR / n) - 1.0
        } else {
            -1.0
        };

        Self {
            periods: rows.len(),
            total_return_pct: (final_equity - 1.0) * 100.0,
            annual_return_pct: annual_return * 100.0,
            volatility_annual_pct: std_dev * PERIODS_PER_YEAR.sqrt() * 100.0,
            sharpe_ratio: calculate_sharpe(&returns, PERIODS_PER_YEAR),
            max_drawdown_pct: max_drawdown(rows) * 100.0,
            best_period_pct: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max) * 100.0,
            worst_period_pct: returns.iter().copied().fold(f64::INFINITY, f64::min) * 100.0,
        }
    }
}

/// Annualized Sharpe ratio with a zero risk-free rate; 0 for a flat series.
fn calculate_sharpe(returns: &[f64], annualization_factor: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean: f64 = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance: f64 =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return 0.0;
    }

    (mean / std_dev) * annualization_factor.sqrt()
}

/// Maximum drawdown as a fraction, with the curve's implicit 1.0 start as the first peak.
fn max_drawdown(rows: &[BacktestRow]) -> f64 {
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for row in rows {
        peak = peak.max(row.equity);
        if peak > 0.0 {
            worst = worst.max((peak - row.equity) / peak);
        }
    }
    worst
}

/// Formatter for weights and backtest results.
pub struct ResultFormatter;

impl ResultFormatter {
    /// Print a weights table followed by the book summary.
    pub fn print_weights(weights: &[WeightRow]) {
        let mut builder = Builder::new();
        builder.push_record(["Ticker", "Side", "Weight"]);
        for row in weights {
            builder.push_record([
                row.ticker.clone(),
                row.side().map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                format!("{:.6}", row.weight),
            ]);
        }
        println!("{}", builder.build().with(Style::rounded()));

        let summary = BookSummary::from_weights(weights);
        println!(
            "  Long:  {:>3} names, gross {:.4}",
            summary.long_count, summary.long_gross
        );
        println!(
            "  Short: {:>3} names, gross {:.4}",
            summary.short_count, summary.short_gross
        );
        println!("  Net:   {:>+.4}", summary.net);
    }

    /// Print a full backtest report.
    pub fn print_report(report: &BacktestReport) {
        let summary = PerformanceSummary::from_rows(&report.rows);

        println!();
        println!("{}", "═".repeat(60).blue());
        println!("{}", " BACKTEST RESULTS ".bold().blue());
        println!("{}", "═".repeat(60).blue());
        println!();

        println!("{}", "Overview".bold().underline());
        println!("  Window:          {} to {}", report.start, report.end);
        println!("  Alignment:       {}", report.policy);
        println!("  Tickers Used:    {}", report.tickers.len());
        println!("  Periods:         {}", summary.periods);
        println!();

        if report.is_empty() {
            println!("  {}", "No overlapping return data in window.".yellow());
        } else {
            println!("{}", "Performance".bold().underline());
            println!(
                "  Final Equity:    {:>12.4}  {}",
                report.final_equity(),
                Self::format_pct_change(summary.total_return_pct)
            );
            println!("  Annual Return:   {:>12.2}%", summary.annual_return_pct);
            println!("  Best Period:     {:>12.2}%", summary.best_period_pct);
            println!("  Worst Period:    {:>12.2}%", summary.worst_period_pct);
            println!();

            println!("{}", "Risk Metrics".bold().underline());
            println!("  Max Drawdown:    {:>12.2}%", -summary.max_drawdown_pct);
            println!("  Volatility:      {:>12.2}%", summary.volatility_annual_pct);
            println!("  Sharpe Ratio:    {:>12.2}", summary.sharpe_ratio);
            println!();
        }

        if !report.excluded.is_empty() {
            println!("{}", "Excluded Tickers".bold().underline());
            for ex in &report.excluded {
                println!(
                    "  {:<10} {:>+9.4}  {}",
                    ex.ticker,
                    ex.weight,
                    ex.reason.to_string().yellow()
                );
            }
            println!();
        }
    }

    /// Print the `Date,Returns,Equity` rows as a table.
    pub fn print_rows(rows: &[BacktestRow]) {
        let mut builder = Builder::new();
        builder.push_record(["Date", "Returns", "Equity"]);
        for row in rows {
            builder.push_record([
                row.date.format("%Y-%m-%d").to_string(),
                format!("{:.6}", row.portfolio_return),
                format!("{:.6}", row.equity),
            ]);
        }
        println!("{}", builder.build().with(Style::rounded()));
    }

    fn format_pct_change(pct: f64) -> String {
        if pct >= 0.0 {
            format!("(+{:.2}%)", pct).green().to_string()
        } else {
            format!("({:.2}%)", pct).red().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows_from_returns(returns: &[f64]) -> Vec<BacktestRow> {
        let mut equity = 1.0;
        returns
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                equity *= 1.0 + r;
                BacktestRow {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
                        + chrono::Duration::days(i as i64),
                    portfolio_return: r,
                    equity,
                }
            })
            .collect()
    }

    #[test]
    fn test_summary_of_empty_rows() {
        let summary = PerformanceSummary::from_rows(&[]);
        assert_eq!(summary.periods, 0);
        assert_eq!(summary.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_summary_total_return_and_extremes() {
        let rows = rows_from_returns(&[0.10, -0.10, 0.05]);
        let summary = PerformanceSummary::from_rows(&rows);

        let expected = (1.1 * 0.9 * 1.05 - 1.0) * 100.0;
        assert!((summary.total_return_pct - expected).abs() < 1e-9);
        assert!((summary.best_period_pct - 10.0).abs() < 1e-9);
        assert!((summary.worst_period_pct + 10.0).abs() < 1e-9);
        assert_eq!(summary.periods, 3);
    }

    #[test]
    fn test_drawdown_from_initial_peak() {
        // Losing from the start counts against the implicit 1.0 peak.
        let rows = rows_from_returns(&[-0.2, 0.1]);
        assert!((max_drawdown(&rows) - 0.2).abs() < 1e-9);

        let rows = rows_from_returns(&[0.25, -0.2, -0.5]);
        // Peak 1.25, trough 0.5.
        assert!((max_drawdown(&rows) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_sharpe_flat_series_is_zero() {
        assert_eq!(calculate_sharpe(&[0.5, 0.5, 0.5], PERIODS_PER_YEAR), 0.0);
        assert!(calculate_sharpe(&[0.01, 0.02, 0.015], PERIODS_PER_YEAR) > 0.0);
    }
}
