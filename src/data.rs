//! Data loading: prediction tables, weight tables and per-ticker price files.
//!
//! Also defines [`PriceSource`], the boundary to whatever fetches prices. The
//! core never raises on a ticker a source cannot provide; the ticker is simply
//! absent from the returned map.

use crate::error::{PortfolioError, Result};
use crate::types::{PredictionRow, PricePoint, PriceSeries, WeightRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TICKER_COLUMNS: &[&str] = &["Ticker", "ticker", "TICKER", "Symbol", "symbol"];
const PREDICTION_COLUMNS: &[&str] = &["Prediction", "prediction", "PREDICTION", "Score", "score"];
const WEIGHT_COLUMNS: &[&str] = &["Weight", "weight", "WEIGHT"];
const DATE_COLUMNS: &[&str] = &[
    "Date", "date", "DATE", "Datetime", "datetime", "Timestamp", "timestamp", "Time", "time",
];
const PRICE_COLUMNS: &[&str] = &[
    "Adj Close", "adj_close", "AdjClose", "Close", "close", "c", "Price", "price",
];

#[derive(Debug, Deserialize)]
struct PredictionCsvRow {
    #[serde(alias = "Ticker", alias = "TICKER", alias = "Symbol", alias = "symbol")]
    ticker: String,
    #[serde(
        alias = "Prediction",
        alias = "PREDICTION",
        alias = "Score",
        alias = "score",
        deserialize_with = "csv::invalid_option"
    )]
    prediction: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeightCsvRow {
    #[serde(alias = "Ticker", alias = "TICKER", alias = "Symbol", alias = "symbol")]
    ticker: String,
    #[serde(alias = "Weight", alias = "WEIGHT", deserialize_with = "csv::invalid_option")]
    weight: Option<f64>,
}

/// Raw price row. Extra OHLCV columns are ignored.
#[derive(Debug, Deserialize)]
struct PriceCsvRow {
    #[serde(
        alias = "Date",
        alias = "DATE",
        alias = "Datetime",
        alias = "datetime",
        alias = "Timestamp",
        alias = "timestamp",
        alias = "Time",
        alias = "time"
    )]
    date: String,
    #[serde(
        default,
        alias = "Adj Close",
        alias = "AdjClose",
        deserialize_with = "csv::invalid_option"
    )]
    adj_close: Option<f64>,
    #[serde(
        default,
        alias = "Close",
        alias = "c",
        alias = "Price",
        alias = "price",
        deserialize_with = "csv::invalid_option"
    )]
    close: Option<f64>,
}

impl PriceCsvRow {
    /// Adjusted close wins over close when both are present.
    fn price(&self) -> Option<f64> {
        self.adj_close.or(self.close)
    }
}

/// Tabular input configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Date format string for parsing (e.g., "%Y-%m-%d"). Common formats are tried otherwise.
    pub date_format: Option<String>,
    /// CSV delimiter character. If None, delimiter is auto-detected.
    pub delimiter: Option<u8>,
    /// Skip invalid rows instead of failing.
    pub skip_invalid: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            delimiter: None,
            skip_invalid: true,
        }
    }
}

/// Detect the CSV delimiter from the first few lines of the file.
///
/// Tries comma, tab, semicolon and pipe and keeps the one that splits every
/// line into the same number (at least two) of fields.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().take(5).filter_map(|l| l.ok()).collect();

    if lines.is_empty() {
        return Ok(b',');
    }

    let delimiters = [b',', b'\t', b';', b'|'];
    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in &delimiters {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_fields(line, delim))
            .collect();

        let first_count = counts[0];
        let all_consistent = counts.iter().all(|&c| c == first_count);

        if all_consistent && first_count >= 2 && first_count > best_score {
            best_score = first_count;
            best_delimiter = delim;
        }
    }

    debug!(
        "Detected delimiter {:?} with {} fields",
        best_delimiter as char, best_score
    );
    Ok(best_delimiter)
}

/// Fields in one line, ignoring delimiters inside double quotes.
fn count_fields(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut fields = 1;
    for &b in line.as_bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            fields += 1;
        }
    }
    fields
}

fn open_reader(path: &Path, config: &DataConfig) -> Result<csv::Reader<File>> {
    let delimiter = match config.delimiter {
        Some(d) => d,
        None => detect_delimiter(path)?,
    };

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Fail early when a required column is absent under every accepted alias.
fn require_column(headers: &StringRecord, aliases: &[&str], path: &Path) -> Result<()> {
    if headers.iter().any(|h| aliases.contains(&h)) {
        Ok(())
    } else {
        Err(PortfolioError::DataError(format!(
            "{} has no '{}' column (found: {})",
            path.display(),
            aliases[0],
            headers.iter().collect::<Vec<_>>().join(", ")
        )))
    }
}

/// Parse a date string, trying an explicit format first and then common ones.
///
/// Datetime strings are accepted; the time component is discarded.
pub fn parse_date(s: &str, format: Option<&str>) -> Result<NaiveDate> {
    let s = s.trim();

    if let Some(fmt) = format {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%m/%d/%Y",
        "%d-%b-%Y", // 15-Jan-2024
        "%b %d, %Y", // Jan 15, 2024
    ];
    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    // Offset-qualified timestamps such as "2024-01-02 00:00:00-05:00".
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt.date_naive());
        }
    }

    Err(PortfolioError::DataError(format!(
        "Could not parse date: '{}'",
        s
    )))
}

/// Load a `Ticker,Prediction` table, preserving row order.
///
/// Rows with a missing or non-finite prediction are skipped. A repeated ticker
/// is an error: the ticker is the key of a prediction set.
pub fn load_predictions(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<PredictionRow>> {
    let path = path.as_ref();
    info!("Loading predictions from: {}", path.display());

    let mut reader = open_reader(path, config)?;
    let headers = reader.headers()?.clone();
    require_column(&headers, TICKER_COLUMNS, path)?;
    require_column(&headers, PREDICTION_COLUMNS, path)?;

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0;

    for (row_num, result) in reader.deserialize::<PredictionCsvRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {}: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(PortfolioError::CsvError(e)),
        };

        let prediction = match row.prediction.filter(|p| p.is_finite()) {
            Some(p) => p,
            None if config.skip_invalid => {
                debug!("Skipping row {}: no usable prediction for {}", row_num + 1, row.ticker);
                skipped += 1;
                continue;
            }
            None => {
                return Err(PortfolioError::DataError(format!(
                    "Invalid prediction for {} at row {}",
                    row.ticker,
                    row_num + 1
                )))
            }
        };

        if !seen.insert(row.ticker.clone()) {
            return Err(PortfolioError::DataError(format!(
                "Duplicate ticker '{}' in {}",
                row.ticker,
                path.display()
            )));
        }

        rows.push(PredictionRow::new(row.ticker, prediction));
    }

    if skipped > 0 {
        warn!("Skipped {} invalid prediction rows", skipped);
    }
    info!("Loaded {} predictions", rows.len());
    Ok(rows)
}

/// Load a `Ticker,Weight` table, preserving row order.
pub fn load_weights(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<WeightRow>> {
    let path = path.as_ref();
    info!("Loading weights from: {}", path.display());

    let mut reader = open_reader(path, config)?;
    let headers = reader.headers()?.clone();
    require_column(&headers, TICKER_COLUMNS, path)?;
    require_column(&headers, WEIGHT_COLUMNS, path)?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (row_num, result) in reader.deserialize::<WeightCsvRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {}: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(PortfolioError::CsvError(e)),
        };

        match row.weight.filter(|w| w.is_finite()) {
            Some(w) => rows.push(WeightRow::new(row.ticker, w)),
            None if config.skip_invalid => {
                debug!("Skipping row {}: no usable weight for {}", row_num + 1, row.ticker);
                skipped += 1;
            }
            None => {
                return Err(PortfolioError::DataError(format!(
                    "Invalid weight for {} at row {}",
                    row.ticker,
                    row_num + 1
                )))
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} invalid weight rows", skipped);
    }
    info!("Loaded {} weights", rows.len());
    Ok(rows)
}

/// Load one ticker's price history.
///
/// Uses `Adj Close` when the file has it, otherwise `Close`/`Price`. The
/// result is sorted ascending with duplicate dates removed (first kept).
pub fn load_price_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<PriceSeries> {
    let path = path.as_ref();
    debug!("Loading prices from: {}", path.display());

    let mut reader = open_reader(path, config)?;
    let headers = reader.headers()?.clone();
    require_column(&headers, DATE_COLUMNS, path)?;
    require_column(&headers, PRICE_COLUMNS, path)?;

    let mut series = PriceSeries::new();
    let mut skipped = 0;

    for (row_num, result) in reader.deserialize::<PriceCsvRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {}: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(PortfolioError::CsvError(e)),
        };

        let date = match parse_date(&row.date, config.date_format.as_deref()) {
            Ok(d) => d,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {} due to date parse error: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let point = PricePoint::new(date, row.price().unwrap_or(f64::NAN));
        if !point.validate() {
            if config.skip_invalid {
                debug!("Skipping row {} due to invalid price: {:?}", row_num + 1, point);
                skipped += 1;
                continue;
            }
            return Err(PortfolioError::DataError(format!(
                "Invalid price at row {}: {:?}",
                row_num + 1,
                point
            )));
        }

        series.push(point);
    }

    if skipped > 0 {
        warn!("Skipped {} invalid rows in {}", skipped, path.display());
    }

    // Stable sort keeps the first occurrence ahead of later duplicates.
    series.sort_by_key(|p| p.date);
    let original_len = series.len();
    series.dedup_by_key(|p| p.date);
    if series.len() < original_len {
        warn!(
            "Removed {} duplicate dates from {}",
            original_len - series.len(),
            path.display()
        );
    }

    Ok(series)
}

/// Load every price file matching `pattern` in `dir`; the ticker is the file stem.
///
/// Files that fail to load are skipped with a warning.
pub fn load_price_dir(
    dir: impl AsRef<Path>,
    pattern: &str,
    config: &DataConfig,
) -> Result<HashMap<String, PriceSeries>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(PortfolioError::DataError(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let glob_pattern = dir.join(pattern);
    let glob_pattern_str = glob_pattern.to_string_lossy();
    info!("Loading price files matching: {}", glob_pattern_str);

    let paths = glob::glob(&glob_pattern_str).map_err(|e| {
        PortfolioError::DataError(format!("Invalid glob pattern '{}': {}", pattern, e))
    })?;

    let mut result = HashMap::new();
    let mut errors = 0;

    for entry in paths {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!("Glob error: {}", e);
                errors += 1;
                continue;
            }
        };

        let Some(ticker) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            warn!("Could not derive ticker from path: {}", path.display());
            errors += 1;
            continue;
        };

        match load_price_csv(&path, config) {
            Ok(series) => {
                result.insert(ticker, series);
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                errors += 1;
            }
        }
    }

    info!(
        "Loaded {} price series from {} ({} errors)",
        result.len(),
        dir.display(),
        errors
    );
    Ok(result)
}

/// Restrict a date-ascending series to `[start, end]`.
pub fn slice_window(series: &[PricePoint], start: NaiveDate, end: NaiveDate) -> PriceSeries {
    series
        .iter()
        .filter(|p| p.date >= start && p.date <= end)
        .copied()
        .collect()
}

/// Provider of per-ticker price histories.
///
/// Implementations return only the tickers they can serve; failures for an
/// individual ticker are logged and omitted, never raised.
pub trait PriceSource {
    fn get_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, PriceSeries>>;
}

/// Price source over already-loaded series.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryPriceSource {
    pub fn new(series: HashMap<String, PriceSeries>) -> Self {
        Self { series }
    }

    pub fn insert(&mut self, ticker: impl Into<String>, series: PriceSeries) {
        self.series.insert(ticker.into(), series);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PriceSource for InMemoryPriceSource {
    fn get_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, PriceSeries>> {
        Ok(tickers
            .iter()
            .filter_map(|t| {
                self.series
                    .get(t)
                    .map(|s| (t.clone(), slice_window(s, start, end)))
            })
            .collect())
    }
}

/// Price source reading `<dir>/<TICKER>.csv` on demand.
#[derive(Debug, Clone)]
pub struct CsvDirPriceSource {
    dir: PathBuf,
    config: DataConfig,
}

impl CsvDirPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            config: DataConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DataConfig) -> Self {
        self.config = config;
        self
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker))
    }
}

impl PriceSource for CsvDirPriceSource {
    fn get_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, PriceSeries>> {
        if !self.dir.is_dir() {
            return Err(PortfolioError::DataError(format!(
                "Not a directory: {}",
                self.dir.display()
            )));
        }

        let mut result = HashMap::new();
        for ticker in tickers {
            let path = self.path_for(ticker);
            if !path.is_file() {
                debug!("No price file for {} at {}", ticker, path.display());
                continue;
            }
            match load_price_csv(&path, &self.config) {
                Ok(series) => {
                    result.insert(ticker.clone(), slice_window(&series, start, end));
                }
                Err(e) => warn!("Failed to load prices for {}: {}", ticker, e),
            }
        }

        info!(
            "Price source served {} of {} tickers from {}",
            result.len(),
            tickers.len(),
            self.dir.display()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_count_fields_ignores_quoted_delimiters() {
        assert_eq!(count_fields("Ticker,Weight", b','), 2);
        assert_eq!(count_fields("\"BRK,B\",0.5", b','), 2);
        assert_eq!(count_fields("\"ODD\"\"NAME\",0.5", b','), 2);
        assert_eq!(count_fields("a;b;c", b';'), 3);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-15", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("2024/01/15", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("01/15/2024", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("2024-01-15 16:00:00", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("2024-01-15T16:00:00Z", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("2024-01-15 00:00:00-05:00", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("1705276800", None).unwrap(), d(2024, 1, 15));
        assert_eq!(parse_date("15.01.2024", Some("%d.%m.%Y")).unwrap(), d(2024, 1, 15));
        assert!(parse_date("not a date", None).is_err());
    }

    #[test]
    fn test_load_predictions_preserves_order() {
        let file = write_temp("Ticker,Prediction\nMSFT,0.2\nAAPL,0.9\nTSLA,-0.4\n");
        let rows = load_predictions(file.path(), &DataConfig::default()).unwrap();
        let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["MSFT", "AAPL", "TSLA"]);
        assert!((rows[1].prediction - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_predictions_skips_bad_values() {
        let file = write_temp("ticker,prediction\nA,0.1\nB,oops\nC,\nD,-0.3\n");
        let rows = load_predictions(file.path(), &DataConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].ticker, "D");

        let strict = DataConfig {
            skip_invalid: false,
            ..Default::default()
        };
        assert!(load_predictions(file.path(), &strict).is_err());
    }

    #[test]
    fn test_load_predictions_rejects_duplicates() {
        let file = write_temp("Ticker,Prediction\nA,0.1\nA,0.2\n");
        let err = load_predictions(file.path(), &DataConfig::default()).unwrap_err();
        assert!(matches!(err, PortfolioError::DataError(_)));
    }

    #[test]
    fn test_load_predictions_requires_columns() {
        let file = write_temp("Name,Value\nA,0.1\n");
        let err = load_predictions(file.path(), &DataConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Ticker"));
    }

    #[test]
    fn test_load_predictions_header_only() {
        let file = write_temp("Ticker,Prediction\n");
        let rows = load_predictions(file.path(), &DataConfig::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_load_weights_semicolon() {
        let file = write_temp("Ticker;Weight\nA;0.5\nB;-0.5\n");
        let rows = load_weights(file.path(), &DataConfig::default()).unwrap();
        assert_eq!(rows, vec![WeightRow::new("A", 0.5), WeightRow::new("B", -0.5)]);
    }

    #[test]
    fn test_load_price_csv_prefers_adjusted_close() {
        let file = write_temp(
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,10,11,9,10.5,10.0,100\n\
             2024-01-02,10,11,9,10.2,9.8,100\n\
             2024-01-03,10,11,9,99.0,99.0,100\n",
        );
        let series = load_price_csv(file.path(), &DataConfig::default()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], PricePoint::new(d(2024, 1, 2), 9.8));
        assert_eq!(series[1], PricePoint::new(d(2024, 1, 3), 10.0));
    }

    #[test]
    fn test_load_price_csv_skips_invalid_prices() {
        let file = write_temp("date,close\n2024-01-02,100\n2024-01-03,0\n2024-01-04,\n2024-01-05,101\n");
        let series = load_price_csv(file.path(), &DataConfig::default()).unwrap();
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 5)]);
    }

    #[test]
    fn test_load_price_dir_and_sources() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("AAA.csv"), "Date,Close\n2024-01-02,10\n2024-01-03,11\n2024-01-04,12\n").unwrap();
        std::fs::write(dir.path().join("BBB.csv"), "Date,Close\n2024-01-02,20\n2024-01-03,19\n").unwrap();
        std::fs::write(dir.path().join("BAD.csv"), "Nothing,Here\n1,2\n").unwrap();

        let all = load_price_dir(dir.path(), "*.csv", &DataConfig::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["AAA"].len(), 3);

        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "ZZZ".to_string()];
        let source = CsvDirPriceSource::new(dir.path());
        let fetched = source.get_prices(&tickers, d(2024, 1, 3), d(2024, 1, 4)).unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched["AAA"].len(), 2);
        assert_eq!(fetched["BBB"].len(), 1);
        assert!(!fetched.contains_key("ZZZ"));

        let memory = InMemoryPriceSource::new(all);
        let fetched = memory.get_prices(&tickers, d(2024, 1, 2), d(2024, 1, 2)).unwrap();
        assert_eq!(fetched["AAA"], vec![PricePoint::new(d(2024, 1, 2), 10.0)]);
        assert!(!fetched.contains_key("ZZZ"));
    }

    #[test]
    fn test_load_price_dir_not_a_directory() {
        let file = write_temp("x");
        assert!(load_price_dir(file.path(), "*.csv", &DataConfig::default()).is_err());
    }
}
