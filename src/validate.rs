use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::constants::{
    DAILY_INTERVAL, FETCH_INTERVAL, FETCH_PERIOD, VALIDATION_SYMBOLS, VALIDATION_TOLERANCE,
};
use crate::logging;
use crate::provider::{FetchRequest, MarketDataProvider, YahooChartProvider};
use crate::series::TimeSeriesStore;

#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    /// Symbols to spot-check (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub symbols: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloseCheck {
    Match {
        intraday_close: f64,
        daily_close: f64,
    },
    Discrepancy {
        intraday_close: f64,
        daily_close: f64,
        difference: f64,
    },
    MissingDaily,
    MissingIntraday,
}

/// Compares the latest intraday close against the latest daily close.
/// Anything further apart than `tolerance` of the daily close is flagged.
pub fn check_last_close(
    symbol: &str,
    intraday: &TimeSeriesStore,
    daily: &TimeSeriesStore,
    tolerance: f64,
) -> CloseCheck {
    let Some(daily_bar) = daily.get(symbol).and_then(|s| s.last()) else {
        return CloseCheck::MissingDaily;
    };
    let Some(intraday_bar) = intraday.get(symbol).and_then(|s| s.last()) else {
        return CloseCheck::MissingIntraday;
    };

    let difference = (intraday_bar.close - daily_bar.close).abs();
    if difference > daily_bar.close * tolerance {
        CloseCheck::Discrepancy {
            intraday_close: intraday_bar.close,
            daily_close: daily_bar.close,
            difference,
        }
    } else {
        CloseCheck::Match {
            intraday_close: intraday_bar.close,
            daily_close: daily_bar.close,
        }
    }
}

pub async fn run(args: ValidateArgs) -> Result<()> {
    let symbols = args.symbols.unwrap_or_else(|| {
        VALIDATION_SYMBOLS
            .iter()
            .map(|s| s.to_string())
            .collect()
    });
    logging::info(
        "validate.start",
        "Validating intraday data against daily closes",
        json!({ "symbols": symbols }),
    );

    let provider = YahooChartProvider::new()?;
    let intraday = provider
        .fetch(&symbols, &FetchRequest::new(FETCH_PERIOD, FETCH_INTERVAL))
        .await?;
    let daily = provider
        .fetch(&symbols, &FetchRequest::new(FETCH_PERIOD, DAILY_INTERVAL))
        .await?;

    for symbol in &symbols {
        println!("\n--- {symbol} ---");
        match check_last_close(symbol, &intraday, &daily, VALIDATION_TOLERANCE) {
            CloseCheck::MissingDaily => println!("Missing {DAILY_INTERVAL} data for {symbol}"),
            CloseCheck::MissingIntraday => println!("Missing {FETCH_INTERVAL} data for {symbol}"),
            CloseCheck::Match {
                intraday_close,
                daily_close,
            } => {
                println!("Daily Last Close: {daily_close:.2}");
                println!("Intraday Last Close: {intraday_close:.2}");
                println!("OK: Data matches.");
            }
            CloseCheck::Discrepancy {
                intraday_close,
                daily_close,
                difference,
            } => {
                println!("Daily Last Close: {daily_close:.2}");
                println!("Intraday Last Close: {intraday_close:.2}");
                println!("Difference: {difference:.4}");
                println!("WARNING: Significant discrepancy between 1d and 15m close!");
                logging::warn(
                    "validate.discrepancy",
                    "Intraday close diverges from daily close",
                    json!({
                        "symbol": symbol,
                        "intraday_close": intraday_close,
                        "daily_close": daily_close,
                        "difference": difference,
                    }),
                );
            }
        }
    }
    Ok(())
}
