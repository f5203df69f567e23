use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;

use crate::config::{require_report, DiscordConfig};
use crate::constants::{DISCORD_HARD_LIMIT, DISCORD_PACK_LIMIT, DISPATCH_PACING_MS};
use crate::logging;

use super::check_response;
use super::dispatch::{deliver_report, Channel, DispatchOutcome};

/// Discord webhook: JSON `content` messages plus a multipart file upload.
pub struct DiscordChannel {
    client: Client,
    webhook_url: String,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sector-pulse/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            webhook_url: config.webhook_url,
        })
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn pack_limit(&self) -> usize {
        DISCORD_PACK_LIMIT
    }

    fn hard_limit(&self) -> usize {
        DISCORD_HARD_LIMIT
    }

    fn header(&self, index: usize, total: usize) -> String {
        format!("**({index}/{total})**\n")
    }

    async fn send(&self, text: &str) -> bool {
        let result = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "content": text }))
            .send()
            .await;
        check_response(self.name(), "message", result).await
    }

    async fn send_attachment(&self, file_name: &str, contents: &str) -> Option<bool> {
        let part = match Part::bytes(contents.as_bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/plain")
        {
            Ok(part) => part,
            Err(err) => {
                logging::error(
                    "discord.attachment_failed",
                    "Failed to build attachment",
                    json!({ "error": err.to_string() }),
                );
                return Some(false);
            }
        };
        let form = Form::new().part("file", part);
        let result = self
            .client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await;
        Some(check_response(self.name(), "attachment", result).await)
    }
}

pub async fn run(report_path: &Path) -> Result<DispatchOutcome> {
    let config = DiscordConfig::from_env()?;
    require_report(report_path)?;

    let report = tokio::fs::read_to_string(report_path)
        .await
        .with_context(|| format!("failed to read report {:?}", report_path))?;
    let file_name = report_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("report.txt");

    let channel = DiscordChannel::new(config)?;
    Ok(deliver_report(
        &channel,
        &report,
        file_name,
        Duration::from_millis(DISPATCH_PACING_MS),
    )
    .await)
}
