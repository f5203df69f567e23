//! Market data retrieval.
//!
//! The analysis only needs a [`TimeSeriesStore`]; where it comes from is
//! behind [`MarketDataProvider`]. The shipped implementation reads the Yahoo
//! Finance chart endpoint one symbol at a time, with a bounded number of
//! requests in flight.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::constants::YAHOO_CHART_URL;
use crate::logging;
use crate::model::Bar;
use crate::series::{BarSeries, TimeSeriesStore};

const MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Lookback range understood by the provider, e.g. `1mo`.
    pub period: String,
    /// Bar size, e.g. `15m` or `1d`.
    pub interval: String,
}

impl FetchRequest {
    pub fn new(period: &str, interval: &str) -> Self {
        Self {
            period: period.to_string(),
            interval: interval.to_string(),
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Symbols that fail or return nothing are simply absent from the store.
    async fn fetch(&self, symbols: &[String], request: &FetchRequest) -> Result<TimeSeriesStore>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(Duration::from_secs(30))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_symbol(&self, symbol: &str, request: &FetchRequest) -> Result<BarSeries> {
        let url = format!("{}/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("range", request.period.as_str()),
                ("interval", request.interval.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("chart request for {symbol}"))?;

        let status = response.status();
        let body = response.text().await.context("read chart body")?;
        if !status.is_success() {
            bail!("chart request for {symbol} returned HTTP {status}: {body}");
        }

        let parsed: ChartResponse =
            serde_json::from_str(&body).with_context(|| format!("decode chart for {symbol}"))?;
        decode_chart(parsed)
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartProvider {
    async fn fetch(&self, symbols: &[String], request: &FetchRequest) -> Result<TimeSeriesStore> {
        let results: Vec<(String, Result<BarSeries>)> = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = self.fetch_symbol(&symbol, request).await;
                (symbol, result)
            })
            .buffer_unordered(MAX_IN_FLIGHT)
            .collect()
            .await;

        let mut store = TimeSeriesStore::new();
        for (symbol, result) in results {
            match result {
                Ok(series) if !series.is_empty() => store.insert(symbol, series),
                Ok(_) => logging::warn(
                    "provider.no_data",
                    "Provider returned no bars",
                    json!({ "symbol": symbol, "interval": request.interval }),
                ),
                Err(err) => logging::warn(
                    "provider.symbol_failed",
                    "Failed to fetch symbol",
                    json!({ "symbol": symbol, "error": format!("{err:#}") }),
                ),
            }
        }

        logging::info(
            "provider.fetch",
            "Market data fetched",
            json!({
                "requested": symbols.len(),
                "received": store.len(),
                "period": request.period,
                "interval": request.interval,
            }),
        );
        Ok(store)
    }
}

/// Turns a chart payload into bars in exchange-local time. Rows with any
/// missing price are dropped.
fn decode_chart(response: ChartResponse) -> Result<BarSeries> {
    if let Some(error) = response.chart.error {
        bail!("chart error {}: {}", error.code, error.description);
    }
    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(BarSeries::default());
    };
    let Some(timestamps) = data.timestamp else {
        return Ok(BarSeries::default());
    };
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("chart payload has no quote block"))?;

    let offset = data.meta.gmtoffset;
    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.into_iter().enumerate() {
        let row = (
            column(&quote.open, i),
            column(&quote.high, i),
            column(&quote.low, i),
            column(&quote.close, i),
            local_time(ts, offset),
        );
        if let (Some(open), Some(high), Some(low), Some(close), Some(timestamp)) = row {
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
            });
        }
    }
    Ok(BarSeries::new(bars))
}

fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

fn local_time(unix_secs: i64, gmtoffset: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(unix_secs.checked_add(gmtoffset)?, 0).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<BarSeries> {
        decode_chart(serde_json::from_str(raw).expect("fixture json"))
    }

    #[test]
    fn decodes_bars_in_exchange_time_and_drops_gaps() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "meta": { "symbol": "XLK", "gmtoffset": -14400 },
                    "timestamp": [1714570200, 1714571100, 1714572000],
                    "indicators": { "quote": [{
                        "open":  [200.0, null, 201.0],
                        "high":  [201.5, 202.0, 203.0],
                        "low":   [199.0, 200.0, 200.5],
                        "close": [201.0, 201.5, 202.5],
                        "volume": [1000, 900, 1100]
                    }]}
                }],
                "error": null
            }
        }"#;

        let series = parse(raw).expect("decode");
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(
            first.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            "2024-05-01 09:30"
        );
        assert_eq!(first.open, 200.0);
        assert_eq!(series.bars()[1].close, 202.5);
    }

    #[test]
    fn missing_result_is_empty_series() {
        let raw = r#"{ "chart": { "result": null, "error": null } }"#;
        assert!(parse(raw).expect("decode").is_empty());
    }

    #[test]
    fn chart_error_is_reported() {
        let raw = r#"{ "chart": { "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" } } }"#;
        let err = parse(raw).expect_err("chart error");
        assert!(err.to_string().contains("Not Found"));
    }
}
