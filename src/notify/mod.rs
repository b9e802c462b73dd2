// src/notify/mod.rs
//! Outbound announcements: chat webhooks and social posts.

pub mod discord;
pub mod slack;
pub mod twitter;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::config::Settings;
use crate::extract;

/// Discord rejects embed titles longer than this.
const EMBED_TITLE_MAX_CHARS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, note: &Announcement) -> Result<()>;
    fn channel(&self) -> &'static str;
}

/// Send and swallow failures; used for side channels that must never fail
/// the stage that triggered them.
pub async fn send_best_effort(notifier: &dyn Notifier, note: &Announcement) {
    if let Err(e) = notifier.send(note).await {
        warn!(target: "notify", channel = notifier.channel(), error = %format!("{e:#}"), "notification failed");
    }
}

/// What a notifier stage should do with a translated issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<T> {
    Post(T),
    QuietDay,
}

/// Discord embed for `date`: title, paragraph digest, page link.
pub fn plan_discord(md: &str, date: &str, settings: &Settings) -> Plan<Announcement> {
    if extract::is_quiet_day(md) {
        return Plan::QuietDay;
    }
    let title: String = extract::extract_title(md)
        .chars()
        .take(EMBED_TITLE_MAX_CHARS)
        .collect();
    Plan::Post(Announcement {
        title,
        body: extract::paragraph_digest(md, extract::DIGEST_MAX_CHARS),
        url: Some(settings.page_url(date)),
    })
}

/// Post text for `date`: first news item (or the title) plus the page link.
pub fn plan_tweet(md: &str, date: &str, settings: &Settings) -> Plan<String> {
    if extract::is_quiet_day(md) {
        return Plan::QuietDay;
    }
    let max = settings.tweet_summary_chars;
    let summary = extract::news_item_summary(md, max)
        .unwrap_or_else(|| extract::truncate_at_comma(&extract::extract_title(md), max));
    Plan::Post(extract::compose_tweet(&summary, &settings.page_url(date)))
}
