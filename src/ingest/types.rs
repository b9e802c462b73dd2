// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Snapshot of one feed entry as seen at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub published: String, // raw feed value, e.g. RFC 2822
    pub author: String,
    pub tags: Vec<String>,
    pub content_html: Option<String>, // full body (content:encoded)
    pub summary: Option<String>,      // description fallback
}

impl FeedEntry {
    /// HTML body: full content first, description as fallback. Empty when neither is present.
    pub fn html_body(&self) -> &str {
        self.content_html
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.summary.as_deref())
            .unwrap_or_default()
    }
}

/// Metadata record written next to the HTML body; read by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryMetadata {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub published: String,
    pub author: String,
    pub tags: Vec<String>,
    pub processed_at: String,
}

impl EntryMetadata {
    pub fn from_entry(entry: &FeedEntry, processed_at: String) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            guid: entry.guid.clone(),
            published: entry.published.clone(),
            author: entry.author.clone(),
            tags: entry.tags.clone(),
            processed_at,
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Entries in feed order (newest first).
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &str;
}
