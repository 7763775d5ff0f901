//! Long/short weight construction from cross-sectional predictions.
//!
//! Predictions are ranked once, in descending order. The first `top_n` rows
//! form the long book and the last `short_n` rows of the *same* ranking form
//! the short book. Each book starts equal-weighted against its configured
//! count, is clipped to the per-name cap, and is then rescaled so that its
//! gross exposure is exactly 1.0.
//!
//! # Example
//!
//! ```
//! use quant_portfolio::construct::{construct_weights, ConstructConfig};
//! use quant_portfolio::types::PredictionRow;
//!
//! let predictions = vec![
//!     PredictionRow::new("A", 0.9),
//!     PredictionRow::new("B", 0.5),
//!     PredictionRow::new("C", 0.1),
//!     PredictionRow::new("D", -0.2),
//!     PredictionRow::new("E", -0.9),
//! ];
//! let config = ConstructConfig::new(2, 2, 0.5);
//! let weights = construct_weights(&predictions, &config).unwrap();
//!
//! assert_eq!(weights.len(), 4);
//! assert_eq!(weights[0].ticker, "A");
//! assert!((weights[0].weight - 0.5).abs() < 1e-12);
//! assert_eq!(weights[3].ticker, "E");
//! assert!((weights[3].weight + 0.5).abs() < 1e-12);
//! ```
//!
//! When the two windows overlap (`top_n + short_n` larger than the universe)
//! a ticker can appear once in each book. Both rows are kept.

use crate::error::{PortfolioError, Result};
use crate::types::{PredictionRow, WeightRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Parameters of a construction call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstructConfig {
    /// Number of highest-ranked tickers to hold long.
    pub top_n: usize,
    /// Number of lowest-ranked tickers to hold short.
    pub short_n: usize,
    /// Maximum absolute initial weight of any single row.
    pub cap_per_name: f64,
}

impl Default for ConstructConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            short_n: 5,
            cap_per_name: 0.05,
        }
    }
}

impl ConstructConfig {
    pub fn new(top_n: usize, short_n: usize, cap_per_name: f64) -> Self {
        Self {
            top_n,
            short_n,
            cap_per_name,
        }
    }

    /// Reject parameters that make the construction meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(PortfolioError::InvalidArgument(
                "top_n must be at least 1".to_string(),
            ));
        }
        if self.short_n == 0 {
            return Err(PortfolioError::InvalidArgument(
                "short_n must be at least 1".to_string(),
            ));
        }
        if !self.cap_per_name.is_finite() || self.cap_per_name <= 0.0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "cap_per_name must be a positive number, got {}",
                self.cap_per_name
            )));
        }
        Ok(())
    }
}

/// Descending order with NaN predictions ranked last.
fn cmp_prediction_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Rank predictions descending. `sort_by` is stable, so ties keep input order.
pub fn rank_predictions(predictions: &[PredictionRow]) -> Vec<&PredictionRow> {
    let mut ranked: Vec<&PredictionRow> = predictions.iter().collect();
    ranked.sort_by(|a, b| cmp_prediction_desc(a.prediction, b.prediction));
    ranked
}

/// Pick the long window (head) and short window (tail) of a ranking and
/// assign equal initial weights against the configured counts.
///
/// The denominator is always `top_n` / `short_n`, even when fewer rows exist.
fn select_books(ranked: &[&PredictionRow], config: &ConstructConfig) -> Vec<WeightRow> {
    let n = ranked.len();
    let long_count = config.top_n.min(n);
    let short_count = config.short_n.min(n);

    let long_weight = 1.0 / config.top_n as f64;
    let short_weight = -1.0 / config.short_n as f64;

    let longs = ranked[..long_count]
        .iter()
        .map(|row| WeightRow::new(row.ticker.clone(), long_weight));
    let shorts = ranked[n - short_count..]
        .iter()
        .map(|row| WeightRow::new(row.ticker.clone(), short_weight));

    longs.chain(shorts).collect()
}

/// Clip every weight into `[-cap, cap]`.
fn clip_to_cap(weights: &mut [WeightRow], cap: f64) {
    for row in weights.iter_mut() {
        row.weight = row.weight.clamp(-cap, cap);
    }
}

/// Rescale the positive and negative rows independently so each side has a
/// gross exposure of 1.0. A side with zero gross is left untouched.
fn normalize_sides(weights: &mut [WeightRow]) {
    let total_long: f64 = weights.iter().map(|w| w.weight).filter(|w| *w > 0.0).sum();
    let total_short: f64 = -weights
        .iter()
        .map(|w| w.weight)
        .filter(|w| *w < 0.0)
        .sum::<f64>();

    if total_long > 0.0 {
        for row in weights.iter_mut().filter(|w| w.weight > 0.0) {
            row.weight /= total_long;
        }
    }
    if total_short > 0.0 {
        for row in weights.iter_mut().filter(|w| w.weight < 0.0) {
            row.weight /= total_short;
        }
    }
}

/// Build a long/short weight vector from predictions.
///
/// Returns the long book followed by the short book, each in descending
/// prediction order. An empty prediction set yields an empty vector.
///
/// Renormalization restores each side to a gross of 1.0 after clipping, so
/// when `cap_per_name * selected_count < 1.0` the final weights exceed the cap.
/// The cap shapes the raw equal-weight allocation, not the deployed gross.
pub fn construct_weights(
    predictions: &[PredictionRow],
    config: &ConstructConfig,
) -> Result<Vec<WeightRow>> {
    config.validate()?;

    if predictions.is_empty() {
        warn!("No predictions supplied, returning empty portfolio");
        return Ok(Vec::new());
    }

    let ranked = rank_predictions(predictions);
    let mut weights = select_books(&ranked, config);

    if config.top_n + config.short_n > predictions.len() {
        debug!(
            "Long and short windows overlap: top_n={} short_n={} universe={}",
            config.top_n,
            config.short_n,
            predictions.len()
        );
    }

    clip_to_cap(&mut weights, config.cap_per_name);
    normalize_sides(&mut weights);

    let summary = BookSummary::from_weights(&weights);
    if summary.max_abs_weight > config.cap_per_name + 1e-12 {
        warn!(
            "Cap {:.4} binds: renormalized weights reach {:.4}",
            config.cap_per_name, summary.max_abs_weight
        );
    }

    info!(
        "Constructed portfolio: {} long, {} short (gross long {:.4}, gross short {:.4})",
        summary.long_count, summary.short_count, summary.long_gross, summary.short_gross
    );

    Ok(weights)
}

/// Build weights from ticker → prediction pairs.
///
/// Pair order is the tie-break order, so callers holding a mapping should
/// pass it in insertion order.
pub fn construct_from_pairs(
    predictions: &[(String, f64)],
    config: &ConstructConfig,
) -> Result<Vec<WeightRow>> {
    let rows: Vec<PredictionRow> = predictions
        .iter()
        .map(|(ticker, prediction)| PredictionRow::new(ticker.clone(), *prediction))
        .collect();
    construct_weights(&rows, config)
}

/// Exposure summary of a weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BookSummary {
    /// Sum of positive weights.
    pub long_gross: f64,
    /// Sum of absolute negative weights.
    pub short_gross: f64,
    /// Long gross minus short gross.
    pub net: f64,
    pub long_count: usize,
    pub short_count: usize,
    /// Largest absolute weight of any row.
    pub max_abs_weight: f64,
}

impl BookSummary {
    pub fn from_weights(weights: &[WeightRow]) -> Self {
        let mut summary = BookSummary::default();
        for row in weights {
            if row.weight > 0.0 {
                summary.long_gross += row.weight;
                summary.long_count += 1;
            } else if row.weight < 0.0 {
                summary.short_gross -= row.weight;
                summary.short_count += 1;
            }
            summary.max_abs_weight = summary.max_abs_weight.max(row.weight.abs());
        }
        summary.net = summary.long_gross - summary.short_gross;
        summary
    }

    /// Long and short gross are equal within `tolerance`.
    pub fn is_dollar_neutral(&self, tolerance: f64) -> bool {
        (self.long_gross - self.short_gross).abs() <= tolerance
    }
}

/// Request payload form of a construction call.
///
/// `predictions` is a JSON object of ticker to prediction. Its key order is
/// kept and breaks ties between equal predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructRequest {
    #[serde(with = "ordered_predictions")]
    pub predictions: Vec<(String, f64)>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_short_n")]
    pub short_n: usize,
    #[serde(default = "default_cap_per_name")]
    pub cap_per_name: f64,
}

pub(crate) fn default_top_n() -> usize { 5 }
pub(crate) fn default_short_n() -> usize { 5 }
pub(crate) fn default_cap_per_name() -> f64 { 0.05 }

impl ConstructRequest {
    pub fn config(&self) -> ConstructConfig {
        ConstructConfig::new(self.top_n, self.short_n, self.cap_per_name)
    }

    pub fn construct(&self) -> Result<Vec<WeightRow>> {
        construct_from_pairs(&self.predictions, &self.config())
    }
}

/// A JSON object read into `(ticker, prediction)` pairs in document order.
/// A repeated key keeps its first position and takes the last value.
mod ordered_predictions {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::collections::HashMap;
    use std::fmt;

    pub fn serialize<S: Serializer>(
        pairs: &[(String, f64)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (ticker, prediction) in pairs {
            map.serialize_entry(ticker, prediction)?;
        }
        map.end()
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of ticker to prediction")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut pairs: Vec<(String, f64)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            let mut index: HashMap<String, usize> = HashMap::new();
            while let Some((ticker, prediction)) = access.next_entry::<String, f64>()? {
                match index.get(&ticker) {
                    Some(&i) => pairs[i].1 = prediction,
                    None => {
                        index.insert(ticker.clone(), pairs.len());
                        pairs.push((ticker, prediction));
                    }
                }
            }
            Ok(pairs)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, f64)>, D::Error> {
        deserializer.deserialize_map(PairsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn rows(pairs: &[(&str, f64)]) -> Vec<PredictionRow> {
        pairs
            .iter()
            .map(|(t, p)| PredictionRow::new(*t, *p))
            .collect()
    }

    fn tickers(weights: &[WeightRow]) -> Vec<&str> {
        weights.iter().map(|w| w.ticker.as_str()).collect()
    }

    #[test]
    fn test_five_name_universe() {
        let preds = rows(&[("A", 0.9), ("B", 0.5), ("C", 0.1), ("D", -0.2), ("E", -0.9)]);
        let weights = construct_weights(&preds, &ConstructConfig::new(2, 2, 0.5)).unwrap();

        assert_eq!(tickers(&weights), vec!["A", "B", "D", "E"]);
        assert!((weights[0].weight - 0.5).abs() < EPS);
        assert!((weights[1].weight - 0.5).abs() < EPS);
        assert!((weights[2].weight + 0.5).abs() < EPS);
        assert!((weights[3].weight + 0.5).abs() < EPS);

        let summary = BookSummary::from_weights(&weights);
        assert!((summary.long_gross - 1.0).abs() < EPS);
        assert!((summary.short_gross - 1.0).abs() < EPS);
        assert!(summary.is_dollar_neutral(EPS));
    }

    #[test]
    fn test_overlapping_windows_keep_both_rows() {
        let preds = rows(&[("A", 0.9), ("B", 0.5), ("C", 0.1)]);
        let weights = construct_weights(&preds, &ConstructConfig::new(2, 2, 1.0)).unwrap();

        assert_eq!(tickers(&weights), vec!["A", "B", "B", "C"]);
        assert!((weights[0].weight - 0.5).abs() < EPS);
        assert!((weights[1].weight - 0.5).abs() < EPS);
        assert!((weights[2].weight + 0.5).abs() < EPS);
        assert!((weights[3].weight + 0.5).abs() < EPS);
    }

    #[test]
    fn test_short_book_comes_from_descending_tail() {
        // Short book order follows the descending ranking, not an ascending sort.
        let preds = rows(&[("LOW", -0.8), ("HIGH", 0.7), ("MID", 0.0), ("LOWER", -0.9)]);
        let weights = construct_weights(&preds, &ConstructConfig::new(1, 2, 1.0)).unwrap();
        assert_eq!(tickers(&weights), vec!["HIGH", "LOW", "LOWER"]);
    }

    #[test]
    fn test_small_universe_uses_configured_denominator() {
        // Two names, top_n = 4: each long starts at 0.25, the side sums to 0.5
        // before renormalization and to 1.0 after.
        let preds = rows(&[("A", 0.3), ("B", 0.2)]);
        let ranked = rank_predictions(&preds);
        let config = ConstructConfig::new(4, 4, 1.0);
        let raw = select_books(&ranked, &config);
        assert_eq!(raw.len(), 4);
        assert!((raw[0].weight - 0.25).abs() < EPS);
        assert!((raw[2].weight + 0.25).abs() < EPS);

        let weights = construct_weights(&preds, &config).unwrap();
        assert!((weights[0].weight - 0.5).abs() < EPS);
        assert!((weights[1].weight - 0.5).abs() < EPS);
    }

    #[test]
    fn test_cap_clips_before_normalization() {
        let preds = rows(&[("A", 3.0), ("B", 2.0), ("C", 1.0), ("D", -1.0)]);
        let ranked = rank_predictions(&preds);
        let config = ConstructConfig::new(2, 1, 0.1);

        let mut raw = select_books(&ranked, &config);
        clip_to_cap(&mut raw, config.cap_per_name);
        assert!(raw.iter().all(|w| w.weight.abs() <= 0.1 + EPS));
        assert!((raw[2].weight + 0.1).abs() < EPS);

        // Renormalization still deploys full gross on each side.
        let weights = construct_weights(&preds, &config).unwrap();
        let summary = BookSummary::from_weights(&weights);
        assert!((summary.long_gross - 1.0).abs() < EPS);
        assert!((summary.short_gross - 1.0).abs() < EPS);
        assert!((weights[0].weight - 0.5).abs() < EPS);
    }

    #[test]
    fn test_loose_cap_keeps_weights_within_cap() {
        let preds = rows(&[("A", 0.4), ("B", 0.3), ("C", 0.2), ("D", 0.1)]);
        let config = ConstructConfig::new(2, 2, 0.6);
        let weights = construct_weights(&preds, &config).unwrap();
        assert!(weights.iter().all(|w| w.weight.abs() <= config.cap_per_name));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let preds = rows(&[("X", 0.5), ("Y", 0.5), ("Z", 0.5), ("W", 0.5)]);
        let config = ConstructConfig::new(2, 2, 1.0);
        let first = construct_weights(&preds, &config).unwrap();
        let second = construct_weights(&preds, &config).unwrap();

        assert_eq!(tickers(&first), vec!["X", "Y", "Z", "W"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_nan_predictions_rank_last() {
        let preds = rows(&[("N", f64::NAN), ("A", 0.1), ("B", -0.1)]);
        let ranked = rank_predictions(&preds);
        assert_eq!(ranked.last().unwrap().ticker, "N");
    }

    #[test]
    fn test_empty_predictions() {
        let weights = construct_weights(&[], &ConstructConfig::default()).unwrap();
        assert!(weights.is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        let preds = rows(&[("A", 0.1)]);
        for config in [
            ConstructConfig::new(0, 1, 0.5),
            ConstructConfig::new(1, 0, 0.5),
            ConstructConfig::new(1, 1, 0.0),
            ConstructConfig::new(1, 1, -0.2),
            ConstructConfig::new(1, 1, f64::NAN),
        ] {
            let err = construct_weights(&preds, &config).unwrap_err();
            assert!(matches!(err, PortfolioError::InvalidArgument(_)));
        }

        // Validation precedes the empty-input shortcut.
        assert!(construct_weights(&[], &ConstructConfig::new(0, 1, 0.5)).is_err());
    }

    #[test]
    fn test_construct_request_defaults() {
        let request: ConstructRequest =
            serde_json::from_str(r#"{"predictions": {"AAA": 1.0, "BBB": -1.0}}"#).unwrap();
        assert_eq!(request.config(), ConstructConfig::default());

        let weights = request.construct().unwrap();
        // Cap 0.05 clips 0.2 → 0.05; renormalization restores 1.0 per side.
        assert_eq!(tickers(&weights), vec!["AAA", "BBB", "AAA", "BBB"]);
        let summary = BookSummary::from_weights(&weights);
        assert!((summary.long_gross - 1.0).abs() < EPS);
        assert!((summary.short_gross - 1.0).abs() < EPS);
    }

    #[test]
    fn test_construct_request_ties_follow_payload_order() {
        let request: ConstructRequest = serde_json::from_str(
            r#"{"predictions": {"Z": 0.5, "A": 0.5, "M": 0.1}, "top_n": 1, "short_n": 1, "cap_per_name": 1.0}"#,
        )
        .unwrap();
        assert_eq!(
            request.predictions,
            vec![
                ("Z".to_string(), 0.5),
                ("A".to_string(), 0.5),
                ("M".to_string(), 0.1)
            ]
        );

        let weights = request.construct().unwrap();
        assert_eq!(
            weights,
            vec![WeightRow::new("Z", 1.0), WeightRow::new("M", -1.0)]
        );

        // Serializes back as an object in the same order.
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.starts_with(r#"{"predictions":{"Z":0.5,"A":0.5,"M":0.1}"#));
    }

    #[test]
    fn test_construct_request_repeated_key_keeps_first_position() {
        let request: ConstructRequest =
            serde_json::from_str(r#"{"predictions": {"B": 0.1, "A": 0.3, "B": 0.3}}"#).unwrap();
        assert_eq!(
            request.predictions,
            vec![("B".to_string(), 0.3), ("A".to_string(), 0.3)]
        );
    }

    #[test]
    fn test_book_summary_counts() {
        let weights = vec![
            WeightRow::new("A", 0.6),
            WeightRow::new("B", 0.4),
            WeightRow::new("C", -1.0),
            WeightRow::new("D", 0.0),
        ];
        let summary = BookSummary::from_weights(&weights);
        assert_eq!(summary.long_count, 2);
        assert_eq!(summary.short_count, 1);
        assert!((summary.net - 0.0).abs() < EPS);
        assert!((summary.max_abs_weight - 1.0).abs() < EPS);
    }
}
