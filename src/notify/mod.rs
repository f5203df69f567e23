pub mod chunk;
pub mod discord;
pub mod dispatch;
pub mod line;

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use reqwest::Response;
use serde_json::json;

use crate::constants::REPORT_PATH;
use crate::logging;

pub use chunk::{number_segments, pack_blocks, split_blocks, MessageSegment};
pub use dispatch::{deliver_report, dispatch, Channel, DispatchOutcome};

#[derive(Debug, Args, Clone)]
pub struct NotifyArgs {
    #[command(subcommand)]
    pub channel: NotifyChannel,
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum NotifyChannel {
    /// Post the report to a Discord webhook
    Discord,
    /// Push the report to a LINE user
    Line,
}

pub async fn run(args: NotifyArgs) -> Result<()> {
    let report_path = Path::new(REPORT_PATH);
    let result = match args.channel {
        NotifyChannel::Discord => discord::run(report_path).await,
        NotifyChannel::Line => line::run(report_path).await,
    };

    match result {
        Ok(outcome) if outcome.complete() => {
            logging::info_simple("notify.complete", "Every segment delivered");
            Ok(())
        }
        Ok(outcome) => {
            logging::warn(
                "notify.partial",
                "Stopped before every segment was delivered",
                json!({ "sent": outcome.sent, "total": outcome.total }),
            );
            Ok(())
        }
        Err(err) => {
            logging::error(
                "notify.aborted",
                "Notification aborted before sending",
                json!({ "error": format!("{err:#}") }),
            );
            Err(err)
        }
    }
}

/// Logs non-success statuses with the raw response body.
pub(crate) async fn check_response(
    channel: &str,
    kind: &str,
    result: reqwest::Result<Response>,
) -> bool {
    match result {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            logging::error(
                "notify.http_status",
                "Channel rejected request",
                json!({
                    "channel": channel,
                    "kind": kind,
                    "status": status.as_u16(),
                    "body": body,
                }),
            );
            false
        }
        Err(err) => {
            logging::error(
                "notify.transport_error",
                "Channel request failed",
                json!({ "channel": channel, "kind": kind, "error": err.to_string() }),
            );
            false
        }
    }
}
