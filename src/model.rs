use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLC sample, timestamped in the exchange's local time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorSpec {
    pub benchmark: String,
    pub constituents: Vec<String>,
}

impl SectorSpec {
    pub fn new(benchmark: &str, constituents: &[&str]) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            constituents: constituents.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.benchmark.as_str()).chain(self.constituents.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Engine,
    Brake,
    Neutral,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Engine => "ENGINE",
            Role::Brake => "BRAKE",
            Role::Neutral => "NEUTRAL",
        };
        f.write_str(label)
    }
}

pub fn default_sectors() -> Vec<SectorSpec> {
    vec![
        SectorSpec::new("XLK", &["NVDA", "AAPL", "MSFT", "AVGO", "MU"]),
        SectorSpec::new("XLV", &["LLY", "JNJ", "ABBV", "UNH", "MRK"]),
        SectorSpec::new("XLF", &["BRK-B", "JPM", "V", "MA", "BAC"]),
        SectorSpec::new("XLY", &["AMZN", "TSLA", "HD", "MCD", "TJX"]),
        SectorSpec::new("XLP", &["WMT", "COST", "PG", "KO", "PM"]),
        SectorSpec::new("XLC", &["META", "GOOGL", "GOOG", "NFLX", "DIS"]),
        SectorSpec::new("XLE", &["XOM", "CVX", "COP", "WMB", "EOG"]),
        SectorSpec::new("XLI", &["GE", "CAT", "RTX", "BA", "UBER"]),
        SectorSpec::new("XLB", &["LIN", "NEM", "FCX", "SHW", "CRH"]),
        SectorSpec::new("XLU", &["NEE", "CEG", "SO", "DUK", "AEP"]),
        SectorSpec::new("XLRE", &["WELL", "PLD", "EQIX", "AMT", "SPG"]),
    ]
}
