use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::{require_report, LineConfig};
use crate::constants::{DISPATCH_PACING_MS, LINE_HARD_LIMIT, LINE_PACK_LIMIT, LINE_REPORT_TITLE};

use super::check_response;
use super::dispatch::{deliver_report, Channel, DispatchOutcome};

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE Messaging API push to a single recipient.
pub struct LineChannel {
    client: Client,
    config: LineConfig,
}

impl LineChannel {
    pub fn new(config: LineConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sector-pulse/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("build reqwest client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Channel for LineChannel {
    fn name(&self) -> &'static str {
        "line"
    }

    fn pack_limit(&self) -> usize {
        LINE_PACK_LIMIT
    }

    fn hard_limit(&self) -> usize {
        LINE_HARD_LIMIT
    }

    async fn send(&self, text: &str) -> bool {
        let payload = PushRequest {
            to: &self.config.user_id,
            messages: [TextMessage { kind: "text", text }],
        };
        let result = self
            .client
            .post(&self.config.push_url)
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await;
        check_response(self.name(), "message", result).await
    }
}

/// Puts the LINE title line on top of the first report block.
fn titled_report(report: &str) -> String {
    format!("{LINE_REPORT_TITLE}\n{}", report.trim_start())
}

pub async fn run(report_path: &Path) -> Result<DispatchOutcome> {
    let config = LineConfig::from_env()?;
    require_report(report_path)?;

    let report = tokio::fs::read_to_string(report_path)
        .await
        .with_context(|| format!("failed to read report {:?}", report_path))?;

    let channel = LineChannel::new(config)?;
    Ok(deliver_report(
        &channel,
        &titled_report(&report),
        "report.txt",
        Duration::from_millis(DISPATCH_PACING_MS),
    )
    .await)
}
