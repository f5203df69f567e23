use anyhow::Result;
use clap::Parser;
use sector_pulse::cli::{self, Cli};
use sector_pulse::{analyze, notify, validate};

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command() {
        cli::Command::Analyze(args) => analyze::run(args).await,
        cli::Command::Notify(args) => notify::run(args).await,
        cli::Command::Validate(args) => validate::run(args).await,
    }
}
