// src/ingest/mod.rs
//! Fetch stage: poll the feed, gate on the dedup marker, and write the
//! latest entry's HTML body and metadata to disk.

pub mod providers;
pub mod types;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::state::MarkerStore;
use crate::ingest::types::{EntryMetadata, FeedSource};

/// Result of comparing a fetched GUID with the stored marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    New,
    Duplicate,
}

/// Exact string comparison; an absent marker always means `New`.
pub fn dedup_gate(current: &str, last: Option<&str>) -> Gate {
    match last {
        Some(l) if l == current => Gate::Duplicate,
        _ => Gate::New,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Latest entry already processed; nothing was written.
    NoNewContent { guid: String },
    Processed(ProcessedEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEntry {
    pub guid: String,
    pub title: String,
    pub published: String,
    pub date_prefix: String,
    pub html_path: PathBuf,
    pub meta_path: PathBuf,
}

/// `YYYY-MM-DD` from an RFC 2822 `pubDate`. `None` when it does not parse.
pub fn date_prefix_from_published(published: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(published.trim())
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Run the fetch stage once.
///
/// Writes `<date>_issue.html` and `<date>_meta.json` under `output_dir`,
/// then stores the new GUID. The marker is the last write, so a crash before
/// it only causes a safe duplicate fetch on the next run.
pub async fn run_fetch(
    source: &dyn FeedSource,
    marker: &dyn MarkerStore,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<FetchOutcome> {
    let entries = source
        .fetch_entries()
        .await
        .with_context(|| format!("fetching feed {}", source.name()))?;
    let Some(latest) = entries.into_iter().next() else {
        bail!("no entries found in feed");
    };

    if latest.guid.is_empty() {
        bail!("latest entry has no guid; cannot deduplicate");
    }

    let last = marker.load()?;
    if dedup_gate(&latest.guid, last.as_deref()) == Gate::Duplicate {
        info!(target: "fetch", guid = %latest.guid, "no new entries, skipping");
        return Ok(FetchOutcome::NoNewContent { guid: latest.guid });
    }

    let html = latest.html_body();
    if html.trim().is_empty() {
        bail!("no HTML content found in entry {}", latest.guid);
    }

    let date_prefix = date_prefix_from_published(&latest.published).unwrap_or_else(|| {
        warn!(
            target: "fetch",
            published = %latest.published,
            "could not parse published date, using system date"
        );
        fallback_prefix(now.date_naive())
    });

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let html_path = output_dir.join(format!("{date_prefix}_issue.html"));
    fs::write(&html_path, html).with_context(|| format!("writing {}", html_path.display()))?;

    let meta = EntryMetadata::from_entry(&latest, now.to_rfc3339());
    let meta_path = output_dir.join(format!("{date_prefix}_meta.json"));
    let json = serde_json::to_string_pretty(&meta).context("serializing metadata")?;
    fs::write(&meta_path, json).with_context(|| format!("writing {}", meta_path.display()))?;

    marker.store(&latest.guid)?;

    info!(
        target: "fetch",
        guid = %latest.guid,
        title = %latest.title,
        published = %latest.published,
        html = %html_path.display(),
        meta = %meta_path.display(),
        "processed new entry"
    );

    Ok(FetchOutcome::Processed(ProcessedEntry {
        guid: latest.guid,
        title: latest.title,
        published: latest.published,
        date_prefix,
        html_path,
        meta_path,
    }))
}

fn fallback_prefix(today: NaiveDate) -> String {
    today.format("%Y-%m-%d").to_string()
}
