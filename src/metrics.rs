use serde::Serialize;
use thiserror::Error;

use crate::model::{Bar, Role};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("no bars in window")]
    EmptySeries,
    #[error("start price is zero")]
    ZeroStartPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMetrics {
    pub symbol: String,
    pub start_price: f64,
    pub end_price: f64,
    pub high_price: f64,
    pub return_pct: f64,
}

impl SymbolMetrics {
    /// First open, last close and highest high of an ordered window.
    pub fn from_bars(symbol: &str, bars: &[Bar]) -> Result<Self, MetricsError> {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(MetricsError::EmptySeries),
        };
        let start_price = first.open;
        let end_price = last.close;
        let high_price = bars
            .iter()
            .map(|bar| bar.high)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            symbol: symbol.to_string(),
            start_price,
            end_price,
            high_price,
            return_pct: percent_return(start_price, end_price)?,
        })
    }
}

pub fn percent_return(start: f64, end: f64) -> Result<f64, MetricsError> {
    if start == 0.0 {
        return Err(MetricsError::ZeroStartPrice);
    }
    Ok((end - start) / start * 100.0)
}

/// Strict inequalities: a spread of exactly `threshold` stays neutral.
pub fn classify(constituent_return: f64, benchmark_return: f64, threshold: f64) -> Role {
    let relative_strength = constituent_return - benchmark_return;
    if relative_strength > threshold {
        Role::Engine
    } else if relative_strength < -threshold {
        Role::Brake
    } else {
        Role::Neutral
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstituentResult {
    pub metrics: SymbolMetrics,
    pub role: Role,
    pub relative_strength: f64,
}

impl ConstituentResult {
    pub fn new(metrics: SymbolMetrics, benchmark: &SymbolMetrics, threshold: f64) -> Self {
        let relative_strength = metrics.return_pct - benchmark.return_pct;
        let role = classify(metrics.return_pct, benchmark.return_pct, threshold);
        Self {
            metrics,
            role,
            relative_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(minute: u32, open: f64, high: f64, close: f64) -> Bar {
        let timestamp = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, minute, 0))
            .expect("valid timestamp");
        Bar {
            timestamp,
            open,
            high,
            low: open.min(close),
            close,
        }
    }

    #[test]
    fn uses_first_open_last_close_and_max_high() {
        let bars = vec![
            bar(0, 100.0, 101.0, 100.5),
            bar(15, 100.5, 115.0, 104.0),
            bar(30, 104.0, 111.0, 110.0),
        ];
        let metrics = SymbolMetrics::from_bars("XLK", &bars).expect("metrics");
        assert_eq!(metrics.start_price, 100.0);
        assert_eq!(metrics.end_price, 110.0);
        assert_eq!(metrics.high_price, 115.0);
        assert!((metrics.return_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn return_matches_formula_for_irregular_prices() {
        let bars = vec![bar(0, 37.13, 40.0, 38.0), bar(15, 38.0, 39.5, 36.77)];
        let metrics = SymbolMetrics::from_bars("KO", &bars).expect("metrics");
        let expected = (36.77 - 37.13) / 37.13 * 100.0;
        assert!((metrics.return_pct - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_window_is_an_error() {
        assert_eq!(
            SymbolMetrics::from_bars("XLK", &[]),
            Err(MetricsError::EmptySeries)
        );
    }

    #[test]
    fn zero_start_price_is_an_error() {
        let bars = vec![bar(0, 0.0, 1.0, 1.0)];
        assert_eq!(
            SymbolMetrics::from_bars("BAD", &bars),
            Err(MetricsError::ZeroStartPrice)
        );
    }

    #[test]
    fn classification_matches_benchmark_scenarios() {
        assert_eq!(classify(12.0, 10.0, 1.0), Role::Engine);
        assert_eq!(classify(8.0, 10.0, 1.0), Role::Brake);
        assert_eq!(classify(10.5, 10.0, 1.0), Role::Neutral);
    }

    #[test]
    fn threshold_edges_are_neutral() {
        assert_eq!(classify(1.0, 0.0, 1.0), Role::Neutral);
        assert_eq!(classify(-1.0, 0.0, 1.0), Role::Neutral);
        assert_eq!(classify(1.000001, 0.0, 1.0), Role::Engine);
        assert_eq!(classify(-1.000001, 0.0, 1.0), Role::Brake);
    }

    #[test]
    fn constituent_result_records_relative_strength() {
        let benchmark = SymbolMetrics {
            symbol: "XLK".into(),
            start_price: 100.0,
            end_price: 110.0,
            high_price: 111.0,
            return_pct: 10.0,
        };
        let stock = SymbolMetrics {
            symbol: "NVDA".into(),
            start_price: 100.0,
            end_price: 112.0,
            high_price: 113.0,
            return_pct: 12.0,
        };
        let result = ConstituentResult::new(stock, &benchmark, 1.0);
        assert_eq!(result.role, Role::Engine);
        assert!((result.relative_strength - 2.0).abs() < 1e-9);
    }
}
