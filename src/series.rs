use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use thiserror::Error;

use crate::model::Bar;

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("cannot parse {0:?}; expected YYYY-MM-DD or YYYY-MM-DD HH:MM")]
    InvalidBound(String),
    #[error("window start {start} is after end {end}")]
    Inverted {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("a {days} day lookback from {latest} is out of range")]
    LookbackOutOfRange { days: u32, latest: NaiveDateTime },
}

/// Ordered bars for one symbol. Timestamps are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Sorts by timestamp and keeps the first bar seen for a duplicated timestamp.
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Bars whose timestamp lies inside the inclusive window.
    pub fn window(&self, window: &AnalysisWindow) -> &[Bar] {
        filter_window(&self.bars, window)
    }
}

/// Narrows an ordered bar slice to the contiguous run inside `window`.
pub fn filter_window<'a>(bars: &'a [Bar], window: &AnalysisWindow) -> &'a [Bar] {
    let lower = match window.start {
        Some(start) => bars.partition_point(|bar| bar.timestamp < start),
        None => 0,
    };
    let upper = match window.end {
        Some(end) => bars.partition_point(|bar| bar.timestamp <= end),
        None => bars.len(),
    };
    if lower >= upper {
        &[]
    } else {
        &bars[lower..upper]
    }
}

/// Symbol keyed store of bar series, as handed over by the data provider.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    series: HashMap<String, BarSeries>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty series are not stored; the symbol reads as absent.
    pub fn insert(&mut self, symbol: impl Into<String>, series: BarSeries) {
        if series.is_empty() {
            return;
        }
        self.series.insert(symbol.into(), series);
    }

    pub fn get(&self, symbol: &str) -> Option<&BarSeries> {
        self.series.get(symbol)
    }

    /// Windowed bars for `symbol`; empty when the symbol is absent.
    pub fn window(&self, symbol: &str, window: &AnalysisWindow) -> &[Bar] {
        self.series
            .get(symbol)
            .map(|series| series.window(window))
            .unwrap_or(&[])
    }

    pub fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.series
            .values()
            .filter_map(|series| series.last().map(|bar| bar.timestamp))
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl AnalysisWindow {
    pub fn new(
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Self, WindowError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(WindowError::Inverted { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Fills an unbounded window with the trailing `days` ending at the
    /// latest bar in the store. Explicit bounds are kept as given.
    pub fn resolve(self, store: &TimeSeriesStore, days: u32) -> Result<Self, WindowError> {
        if self.start.is_some() || self.end.is_some() {
            return Ok(self);
        }
        let Some(latest) = store.latest_timestamp() else {
            return Ok(self);
        };
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|lookback| latest.checked_sub_signed(lookback))
            .ok_or(WindowError::LookbackOutOfRange { days, latest })?;
        Self::new(Some(start), Some(latest))
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start
            .map(|ts| ts.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| "Earliest".to_string());
        let end = self
            .end
            .map(|ts| ts.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| "Latest".to_string());
        write!(f, "{start} -> {end}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Start,
    End,
}

/// Parses a CLI bound. A bare date opens the day for a start bound and
/// closes it for an end bound.
pub fn parse_bound(raw: &str, kind: BoundKind) -> Result<NaiveDateTime, WindowError> {
    let raw = raw.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| WindowError::InvalidBound(raw.to_string()))?;
    let ts = match kind {
        BoundKind::Start => date.and_hms_opt(0, 0, 0),
        BoundKind::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    ts.ok_or_else(|| WindowError::InvalidBound(raw.to_string()))
}
