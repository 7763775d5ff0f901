//! Command-line interface for portfolio construction and backtesting.

use quant_portfolio::analytics::{PerformanceSummary, ResultFormatter};
use quant_portfolio::backtest::{AlignPolicy, BacktestConfig, BacktestReport, Backtester};
use quant_portfolio::config::PortfolioFileConfig;
use quant_portfolio::construct::{construct_weights, ConstructConfig, ConstructRequest};
use quant_portfolio::data::{load_predictions, load_weights, parse_date, CsvDirPriceSource, DataConfig};
use quant_portfolio::error::{PortfolioError, Result};
use quant_portfolio::export::{
    backtest_to_csv_string, to_json, weights_to_csv_string, write_backtest_csv, write_weights_csv,
};
use quant_portfolio::types::WeightRow;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Long/short portfolio construction from model predictions, with a static-weight backtester.
#[derive(Parser)]
#[command(name = "quant")]
#[command(author = "Johan")]
#[command(version)]
#[command(about = "Build long/short weights from predictions and backtest them")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build equal-weight long/short weights from a predictions table
    Construct {
        /// Path to a Ticker,Prediction CSV
        #[arg(short, long, conflicts_with = "request", required_unless_present = "request")]
        predictions: Option<PathBuf>,

        /// Path to a JSON request ({"predictions": {...}, "top_n": .., ...});
        /// its own parameters take precedence over the flags below
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Number of names on the long side
        #[arg(long, default_value = "5")]
        top_n: usize,

        /// Number of names on the short side
        #[arg(long, default_value = "5")]
        short_n: usize,

        /// Per-name absolute weight cap
        #[arg(long, default_value = "0.05")]
        cap_per_name: f64,

        /// Write the Ticker,Weight CSV here instead of printing it
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Backtest a static weight vector over a date window
    Backtest {
        /// Path to a Ticker,Weight CSV
        #[arg(short, long)]
        weights: PathBuf,

        /// Directory with one <TICKER>.csv price file per ticker
        #[arg(short, long)]
        prices_dir: PathBuf,

        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,

        /// Date alignment across tickers
        #[arg(short, long, value_enum, default_value = "inner")]
        align: AlignArg,

        /// Compute per-ticker returns on a single thread
        #[arg(long)]
        sequential: bool,

        /// Write the Date,Returns,Equity CSV here instead of printing the rows
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Create an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "portfolio.toml")]
        output: PathBuf,
    },

    /// Run construction and/or backtest from a configuration file
    RunConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum AlignArg {
    /// Dates where every ticker has a return
    Inner,
    /// Dates where any ticker has a return
    Union,
}

impl From<AlignArg> for AlignPolicy {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Inner => AlignPolicy::Inner,
            AlignArg::Union => AlignPolicy::Union,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) -> Result<()> {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            PortfolioError::ConfigError(format!("Failed to set tracing subscriber: {}", e))
        })
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging()?;

    match &cli.command {
        Commands::Construct {
            predictions,
            request,
            top_n,
            short_n,
            cap_per_name,
            output,
        } => {
            let weights = match (request, predictions) {
                (Some(request), _) => construct_from_request(request)?,
                (None, Some(predictions)) => construct_from_csv(
                    predictions,
                    &ConstructConfig::new(*top_n, *short_n, *cap_per_name),
                )?,
                (None, None) => {
                    return Err(PortfolioError::InvalidArgument(
                        "either --predictions or --request is required".to_string(),
                    ))
                }
            };
            match output {
                Some(path) => {
                    write_weights_csv(&weights, path)?;
                    println!("Wrote {} weights to {}", weights.len(), path.display());
                    Ok(())
                }
                None => emit_weights(&weights, cli.output),
            }
        }

        Commands::Backtest {
            weights,
            prices_dir,
            start,
            end,
            align,
            sequential,
            output,
        } => {
            let start = parse_date(start, Some("%Y-%m-%d"))?;
            let end = parse_date(end, Some("%Y-%m-%d"))?;
            let config = BacktestConfig {
                align: (*align).into(),
                parallel: !*sequential,
            };
            let weights = load_weights(weights, &DataConfig::default())?;
            let report = run_backtest(&weights, prices_dir, start, end, config)?;
            match output {
                Some(path) => {
                    write_backtest_csv(&report.rows, path)?;
                    if cli.output == OutputFormat::Text {
                        ResultFormatter::print_report(&report);
                    }
                    println!("Wrote {} rows to {}", report.rows.len(), path.display());
                    Ok(())
                }
                None => emit_report(&report, cli.output),
            }
        }

        Commands::Init { output } => init_config(output),

        Commands::RunConfig { config } => run_from_config(config, cli.output),
    }
}

fn construct_from_csv(path: &Path, config: &ConstructConfig) -> Result<Vec<WeightRow>> {
    info!("Loading predictions from: {}", path.display());
    let predictions = load_predictions(path, &DataConfig::default())?;
    construct_weights(&predictions, config)
}

fn construct_from_request(path: &Path) -> Result<Vec<WeightRow>> {
    info!("Loading construction request from: {}", path.display());
    let content = fs::read_to_string(path)?;
    let request: ConstructRequest = serde_json::from_str(&content)?;
    request.construct()
}

fn run_backtest(
    weights: &[WeightRow],
    prices_dir: &Path,
    start: NaiveDate,
    end: NaiveDate,
    config: BacktestConfig,
) -> Result<BacktestReport> {
    let source = CsvDirPriceSource::new(prices_dir);
    Backtester::new(config).run_with_source(weights, &source, start, end)
}

fn emit_weights(weights: &[WeightRow], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => ResultFormatter::print_weights(weights),
        OutputFormat::Json => println!("{}", to_json(weights)?),
        OutputFormat::Csv => print!("{}", weights_to_csv_string(weights)?),
    }
    Ok(())
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    report: &'a BacktestReport,
    summary: PerformanceSummary,
}

fn emit_report(report: &BacktestReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => {
            ResultFormatter::print_report(report);
            if !report.is_empty() {
                ResultFormatter::print_rows(&report.rows);
            }
        }
        OutputFormat::Json => {
            let json = ReportJson {
                report,
                summary: PerformanceSummary::from_rows(&report.rows),
            };
            println!("{}", to_json(&json)?);
        }
        OutputFormat::Csv => print!("{}", backtest_to_csv_string(&report.rows)?),
    }
    Ok(())
}

fn init_config(output: &PathBuf) -> Result<()> {
    let example = PortfolioFileConfig::example();
    fs::write(output, example)?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to point at your data, then run:");
    println!("  quant run-config -c {}", output.display());
    Ok(())
}

fn run_from_config(config_path: &PathBuf, output: OutputFormat) -> Result<()> {
    let file_config = PortfolioFileConfig::load(config_path)?;

    let mut constructed = None;
    if let Some(predictions) = &file_config.construct.predictions {
        let weights = construct_from_csv(Path::new(predictions), &file_config.construct_config()?)?;
        if let Some(path) = &file_config.construct.output {
            write_weights_csv(&weights, path)?;
        }
        emit_weights(&weights, output)?;
        constructed = Some(weights);
    }

    let Some(prices_dir) = &file_config.backtest.prices_dir else {
        if constructed.is_none() {
            return Err(PortfolioError::ConfigError(
                "Config has neither construct.predictions nor backtest.prices_dir".to_string(),
            ));
        }
        return Ok(());
    };

    // Freshly constructed weights win unless the backtest names its own file.
    let weights = match (&file_config.backtest.weights, constructed) {
        (None, Some(weights)) => weights,
        _ => {
            let path = file_config.weights_path().ok_or_else(|| {
                PortfolioError::ConfigError(
                    "No weights for backtest: set backtest.weights, construct.output or construct.predictions"
                        .to_string(),
                )
            })?;
            load_weights(path, &DataConfig::default())?
        }
    };

    let (start, end) = file_config.date_range()?;
    let report = run_backtest(
        &weights,
        Path::new(prices_dir),
        start,
        end,
        file_config.backtest_config()?,
    )?;
    if let Some(path) = &file_config.backtest.output {
        write_backtest_csv(&report.rows, path)?;
    }
    emit_report(&report, output)
}
