//! Export utilities for weights and backtest results.
//!
//! | Table | Header |
//! |-------|--------|
//! | Weights | `Ticker,Weight` |
//! | Backtest | `Date,Returns,Equity` |
//!
//! Both tables can be written to a file or rendered to a string for stdout.

use crate::error::Result;
use crate::types::{BacktestRow, WeightRow};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Configuration for exports.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Date format for the `Date` column.
    pub date_format: String,
    /// Decimal precision for numeric values; `None` writes full precision.
    pub precision: Option<usize>,
    /// Delimiter for CSV files.
    pub delimiter: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            precision: None,
            delimiter: b',',
        }
    }
}

fn format_value(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(prec) => format!("{:.prec$}", value),
        None => value.to_string(),
    }
}

fn write_weights<W: Write>(writer: &mut W, weights: &[WeightRow], config: &ExportConfig) -> Result<()> {
    // Tickers are free text, so fields go through the csv writer for quoting.
    let mut wtr = WriterBuilder::new()
        .delimiter(config.delimiter)
        .from_writer(writer);
    wtr.write_record(["Ticker", "Weight"])?;
    for row in weights {
        let weight = format_value(row.weight, config.precision);
        wtr.write_record([row.ticker.as_str(), weight.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_rows<W: Write>(writer: &mut W, rows: &[BacktestRow], config: &ExportConfig) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(config.delimiter)
        .from_writer(writer);
    wtr.write_record(["Date", "Returns", "Equity"])?;
    for row in rows {
        wtr.write_record([
            row.date.format(&config.date_format).to_string(),
            format_value(row.portfolio_return, config.precision),
            format_value(row.equity, config.precision),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write weights to a `Ticker,Weight` CSV file.
pub fn write_weights_csv(weights: &[WeightRow], path: impl AsRef<Path>) -> Result<()> {
    write_weights_csv_with(weights, path, &ExportConfig::default())
}

pub fn write_weights_csv_with(
    weights: &[WeightRow],
    path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_weights(&mut writer, weights, config)?;
    writer.flush()?;
    info!("Wrote {} weights to {}", weights.len(), path.display());
    Ok(())
}

/// Write backtest rows to a `Date,Returns,Equity` CSV file.
pub fn write_backtest_csv(rows: &[BacktestRow], path: impl AsRef<Path>) -> Result<()> {
    write_backtest_csv_with(rows, path, &ExportConfig::default())
}

pub fn write_backtest_csv_with(
    rows: &[BacktestRow],
    path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_rows(&mut writer, rows, config)?;
    writer.flush()?;
    info!("Wrote {} backtest rows to {}", rows.len(), path.display());
    Ok(())
}

/// Render weights as CSV text.
pub fn weights_to_csv_string(weights: &[WeightRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_weights(&mut buf, weights, &ExportConfig::default())?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render backtest rows as CSV text.
pub fn backtest_to_csv_string(rows: &[BacktestRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_rows(&mut buf, rows, &ExportConfig::default())?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pretty JSON of any exportable value.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
