// src/notify/slack.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Announcement, Notifier};
use crate::config::optional_env;

/// Incoming-webhook notifier. Without a webhook URL every send is a no-op.
pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn from_env() -> Self {
        Self {
            webhook_url: optional_env("SLACK_WEBHOOK"),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn new(url: String) -> Self {
        Self {
            webhook_url: Some(url),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}

pub(crate) fn format_text(note: &Announcement) -> String {
    let mut text = format!("*{}*", note.title);
    if !note.body.is_empty() {
        text.push('\n');
        text.push_str(&note.body);
    }
    if let Some(url) = &note.url {
        text.push('\n');
        text.push_str(url);
    }
    text
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, note: &Announcement) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            tracing::debug!(target: "notify", "Slack disabled (no SLACK_WEBHOOK)");
            return Ok(());
        };

        let body = serde_json::json!({ "text": format_text(note) });
        self.client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "slack"
    }
}
