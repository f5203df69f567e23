use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::config::AnalysisConfig;
use crate::constants::{DEFAULT_LOOKBACK_DAYS, FETCH_INTERVAL, FETCH_PERIOD, REPORT_PATH};
use crate::logging;
use crate::provider::{FetchRequest, MarketDataProvider, YahooChartProvider};
use crate::report::build_report;
use crate::series::{parse_bound, AnalysisWindow, BoundKind};

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Window start (YYYY-MM-DD or YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (YYYY-MM-DD or YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub end: Option<String>,

    /// Days to look back when neither --start nor --end is given
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    pub days: u32,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl AnalyzeArgs {
    pub fn window(&self) -> Result<AnalysisWindow> {
        let start = self
            .start
            .as_deref()
            .map(|raw| parse_bound(raw, BoundKind::Start))
            .transpose()?;
        let end = self
            .end
            .as_deref()
            .map(|raw| parse_bound(raw, BoundKind::End))
            .transpose()?;
        Ok(AnalysisWindow::new(start, end)?)
    }
}

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let config = AnalysisConfig::from_env()?;
    let provider = YahooChartProvider::new()?;
    if let Some(report) = analyze(&provider, &config, &args, Path::new(REPORT_PATH)).await? {
        println!("{report}");
    }
    Ok(())
}

/// Fetches, analyzes and writes the report file. Returns `None` without
/// touching `output` when the provider had nothing at all.
pub async fn analyze<P>(
    provider: &P,
    config: &AnalysisConfig,
    args: &AnalyzeArgs,
    output: &Path,
) -> Result<Option<String>>
where
    P: MarketDataProvider + ?Sized,
{
    let requested = args.window()?;
    let symbols = config.all_symbols();
    logging::info(
        "analyze.fetch",
        "Fetching market data",
        json!({
            "symbols": symbols.len(),
            "period": FETCH_PERIOD,
            "interval": FETCH_INTERVAL,
        }),
    );

    let store = provider
        .fetch(&symbols, &FetchRequest::new(FETCH_PERIOD, FETCH_INTERVAL))
        .await?;
    if store.is_empty() {
        println!("No data.");
        return Ok(None);
    }

    let window = requested.resolve(&store, args.days)?;
    if requested != window {
        logging::info(
            "analyze.auto_range",
            "No bounds given, using trailing window",
            json!({ "days": args.days, "window": window.to_string() }),
        );
    }

    let report = build_report(config, &store, &window);
    if report.sectors.is_empty() {
        logging::warn(
            "analyze.empty_report",
            "No sector had data inside the window",
            json!({ "window": window.to_string() }),
        );
    }

    let text = report.render();
    tokio::fs::write(output, &text)
        .await
        .with_context(|| format!("failed to write report {:?}", output))?;
    logging::info(
        "analyze.report_written",
        "Report written",
        json!({
            "path": output.display().to_string(),
            "sectors": report.sectors.len(),
            "chars": text.chars().count(),
        }),
    );
    Ok(Some(text))
}
