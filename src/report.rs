use chrono::NaiveDateTime;
use serde_json::json;

use crate::config::AnalysisConfig;
use crate::constants::{BLOCK_DELIMITER, TITLE_RULE_WIDTH};
use crate::logging;
use crate::metrics::{ConstituentResult, MetricsError, SymbolMetrics};
use crate::model::SectorSpec;
use crate::series::{AnalysisWindow, TimeSeriesStore};

const TABLE_HEADERS: [&str; 7] = [
    "Ticker",
    "Role",
    "Start Price",
    "High Price",
    "Close Price",
    "Return(%)",
    "Rel vs Sec",
];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct SectorResult {
    pub benchmark: SymbolMetrics,
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    /// Sorted by return, best first.
    pub constituents: Vec<ConstituentResult>,
    pub failures: Vec<(String, MetricsError)>,
}

/// Analyzes one sector. `None` means the benchmark has nothing usable in
/// the window and the sector is left out of the report entirely.
pub fn analyze_sector(
    sector: &SectorSpec,
    store: &TimeSeriesStore,
    window: &AnalysisWindow,
    threshold: f64,
) -> Option<SectorResult> {
    let bench_bars = store.window(&sector.benchmark, window);
    let (first, last) = (bench_bars.first()?, bench_bars.last()?);

    let benchmark = match SymbolMetrics::from_bars(&sector.benchmark, bench_bars) {
        Ok(metrics) => metrics,
        Err(err) => {
            logging::warn(
                "report.benchmark_failed",
                "Benchmark metrics unavailable, sector skipped",
                json!({ "symbol": sector.benchmark, "error": err.to_string() }),
            );
            return None;
        }
    };

    let mut constituents = Vec::with_capacity(sector.constituents.len());
    let mut failures = Vec::new();
    for symbol in &sector.constituents {
        let bars = store.window(symbol, window);
        if bars.is_empty() {
            continue;
        }
        match SymbolMetrics::from_bars(symbol, bars) {
            Ok(metrics) => constituents.push(ConstituentResult::new(metrics, &benchmark, threshold)),
            Err(err) => {
                logging::warn(
                    "report.constituent_failed",
                    "Constituent metrics unavailable",
                    json!({ "symbol": symbol, "sector": sector.benchmark, "error": err.to_string() }),
                );
                failures.push((symbol.clone(), err));
            }
        }
    }

    // sort_by is stable, ties keep declaration order
    constituents.sort_by(|a, b| b.metrics.return_pct.total_cmp(&a.metrics.return_pct));

    Some(SectorResult {
        benchmark,
        first_timestamp: first.timestamp,
        last_timestamp: last.timestamp,
        constituents,
        failures,
    })
}

impl SectorResult {
    pub fn render(&self) -> String {
        let bench = &self.benchmark;
        let mut out = format!(
            "{} Analysis Window: {} to {}\n",
            bench.symbol,
            self.first_timestamp.format(TIMESTAMP_FORMAT),
            self.last_timestamp.format(TIMESTAMP_FORMAT)
        );
        out.push_str(&format!(
            "Sector {}: Start={:.2}, End={:.2}, High={:.2}, Return={:.2}%",
            bench.symbol, bench.start_price, bench.end_price, bench.high_price, bench.return_pct
        ));

        if !self.constituents.is_empty() {
            let rows: Vec<[Cell; 7]> = self.constituents.iter().map(constituent_row).collect();
            out.push('\n');
            out.push_str(&render_grid(&TABLE_HEADERS, &rows));
        }
        for (symbol, err) in &self.failures {
            out.push_str(&format!("\n{symbol}: metrics unavailable ({err})"));
        }
        out
    }
}

fn constituent_row(result: &ConstituentResult) -> [Cell; 7] {
    let m = &result.metrics;
    [
        Cell::text(&m.symbol),
        Cell::text(&result.role.to_string()),
        Cell::number(m.start_price),
        Cell::number(m.high_price),
        Cell::number(m.end_price),
        Cell::number(m.return_pct),
        Cell::number(result.relative_strength),
    ]
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    right_aligned: bool,
}

impl Cell {
    fn text(value: &str) -> Self {
        Self {
            text: value.to_string(),
            right_aligned: false,
        }
    }

    fn number(value: f64) -> Self {
        Self {
            text: format!("{value:.2}"),
            right_aligned: true,
        }
    }
}

/// Grid table with a `=` rule under the header and `-` rules between rows.
fn render_grid<const N: usize>(headers: &[&str; N], rows: &[[Cell; N]]) -> String {
    let mut widths = [0usize; N];
    for (col, header) in headers.iter().enumerate() {
        widths[col] = header.chars().count();
    }
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(cell.text.chars().count());
        }
    }
    let numeric: Vec<bool> = (0..N)
        .map(|col| rows.first().is_some_and(|row| row[col].right_aligned))
        .collect();

    let mut lines = vec![grid_rule(&widths, '-')];
    let header_cells: Vec<(&str, bool)> = headers
        .iter()
        .zip(&numeric)
        .map(|(header, right)| (*header, *right))
        .collect();
    lines.push(grid_line(&header_cells, &widths));
    lines.push(grid_rule(&widths, '='));
    for row in rows {
        let cells: Vec<(&str, bool)> = row
            .iter()
            .map(|cell| (cell.text.as_str(), cell.right_aligned))
            .collect();
        lines.push(grid_line(&cells, &widths));
        lines.push(grid_rule(&widths, '-'));
    }
    lines.join("\n")
}

fn grid_rule(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat(fill).take(width + 2));
        line.push('+');
    }
    line
}

fn grid_line(cells: &[(&str, bool)], widths: &[usize]) -> String {
    let mut out = String::from("|");
    for (&(text, right), &width) in cells.iter().zip(widths) {
        let cell = if right {
            format!(" {text:>width$} |")
        } else {
            format!(" {text:<width$} |")
        };
        out.push_str(&cell);
    }
    out
}

/// Rendered sector blocks for one run, in configured sector order.
#[derive(Debug, Clone)]
pub struct Report {
    pub window: AnalysisWindow,
    pub sectors: Vec<SectorResult>,
}

pub fn build_report(
    config: &AnalysisConfig,
    store: &TimeSeriesStore,
    window: &AnalysisWindow,
) -> Report {
    let sectors = config
        .sectors
        .iter()
        .filter_map(|sector| analyze_sector(sector, store, window, config.role_threshold))
        .collect();
    Report {
        window: *window,
        sectors,
    }
}

impl Report {
    pub fn title(&self) -> String {
        format!("MARKET ANALYSIS REPORT (Window: {})", self.window)
    }

    /// Title, rule, then sector blocks separated by delimiter lines.
    pub fn render(&self) -> String {
        let mut out = self.title();
        out.push('\n');
        out.push_str(&"=".repeat(TITLE_RULE_WIDTH));
        out.push('\n');

        let blocks: Vec<String> = self.sectors.iter().map(SectorResult::render).collect();
        if !blocks.is_empty() {
            out.push('\n');
            out.push_str(&blocks.join(&format!("\n\n{BLOCK_DELIMITER}\n\n")));
            out.push('\n');
        }
        out
    }
}
