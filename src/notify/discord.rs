// src/notify/discord.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Announcement, Notifier};
use crate::config::{require_env, ConfigError};

/// Embed accent colour.
const EMBED_COLOR: u32 = 0x5865F2;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
    base_delay: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(require_env("DISCORD_WEBHOOK")?))
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// First backoff step; doubles per attempt.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn backoff(&self, attempt: u8) -> Duration {
        let factor = 1u32
            .checked_shl(u32::from(attempt - 1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, note: &Announcement) -> Result<()> {
        let payload = DiscordWebhookPayload::embed(note);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => {
                        tracing::info!(target: "notify", attempt, "discord embed posted");
                        return Ok(());
                    }
                    Err(e) => anyhow!("Discord webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("Discord webhook request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::warn!(target: "notify", attempt, error = %err, "discord post failed, retrying");
            tokio::time::sleep(self.backoff(attempt)).await;
        }
    }

    fn channel(&self) -> &'static str {
        "discord"
    }
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    color: u32,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn embed(note: &Announcement) -> Self {
        Self {
            content: None,
            embeds: vec![DiscordEmbed {
                title: note.title.clone(),
                description: note.body.clone(),
                url: note.url.clone(),
                color: EMBED_COLOR,
            }],
        }
    }
}
