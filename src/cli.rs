use clap::{Parser, Subcommand};

use crate::analyze::AnalyzeArgs;
use crate::notify::NotifyArgs;
use crate::validate::ValidateArgs;

#[derive(Debug, Parser)]
#[command(author, version, about = "Sector basket relative-strength reporter")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(self) -> Command {
        self.command.unwrap_or_default()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch intraday bars, analyze every sector and write the report file
    Analyze(AnalyzeArgs),
    /// Deliver the report file over a messaging channel
    Notify(NotifyArgs),
    /// Spot-check intraday closes against daily closes
    Validate(ValidateArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Analyze(AnalyzeArgs::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_analyze_with_fourteen_days() {
        let cli = Cli::try_parse_from(["sector-pulse"]).expect("parse");
        match cli.command() {
            Command::Analyze(args) => {
                assert_eq!(args.days, 14);
                assert!(args.start.is_none() && args.end.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_window_flags() {
        let cli = Cli::try_parse_from([
            "sector-pulse",
            "analyze",
            "--start",
            "2024-05-01 09:30",
            "--end",
            "2024-05-10",
        ])
        .expect("parse");
        match cli.command() {
            Command::Analyze(args) => {
                assert_eq!(args.start.as_deref(), Some("2024-05-01 09:30"));
                assert_eq!(args.end.as_deref(), Some("2024-05-10"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_lookback_is_rejected() {
        let result = Cli::try_parse_from(["sector-pulse", "analyze", "--days", "-5"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["sector-pulse", "analyze", "--days", "30"]).expect("parse");
        match cli.command() {
            Command::Analyze(args) => assert_eq!(args.days, 30),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_notify_channel() {
        let cli = Cli::try_parse_from(["sector-pulse", "notify", "line"]).expect("parse");
        assert!(matches!(
            cli.command(),
            Command::Notify(NotifyArgs {
                channel: crate::notify::NotifyChannel::Line
            })
        ));
    }

    #[test]
    fn validate_accepts_symbol_list() {
        let cli = Cli::try_parse_from(["sector-pulse", "validate", "--symbols", "NVDA,SPY"])
            .expect("parse");
        match cli.command() {
            Command::Validate(args) => {
                assert_eq!(args.symbols, Some(vec!["NVDA".to_string(), "SPY".to_string()]))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
