// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{FeedEntry, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<TextNode>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    author: Option<String>,
    // elements match by local name: `dc:creator`
    #[serde(rename = "creator")]
    creator: Option<String>,
    #[serde(rename = "category", default)]
    category: Vec<TextNode>,
    description: Option<String>,
    // `content:encoded`
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
}
/// Element whose attributes (`isPermaLink`, `domain`) we ignore.
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// RSS 2.0 feed source, either over HTTP or from an in-memory document.
pub struct RssFeed {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeed {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ainews-pipeline/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building feed http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    /// Parse an RSS 2.0 document into entries, preserving feed order.
    pub fn parse_entries(s: &str) -> Result<Vec<FeedEntry>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let out = rss
            .channel
            .item
            .into_iter()
            .map(|it| {
                let link = it.link.unwrap_or_default().trim().to_string();
                FeedEntry {
                    title: it.title.unwrap_or_default().trim().to_string(),
                    guid: it
                        .guid
                        .map(|g| g.value.trim().to_string())
                        .unwrap_or_default(),
                    link,
                    published: it.pub_date.unwrap_or_default().trim().to_string(),
                    author: it
                        .author
                        .or(it.creator)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                    tags: it
                        .category
                        .into_iter()
                        .map(|c| c.value.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect(),
                    content_html: it.content_encoded,
                    summary: it.description,
                }
            })
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_entries(s),
            Mode::Http { url, client } => {
                let resp = client.get(url).send().await.context("feed http get()")?;
                let status = resp.status();
                if !status.is_success() {
                    anyhow::bail!("feed returned HTTP {status}");
                }
                let body = resp.text().await.context("feed http .text()")?;
                Self::parse_entries(&body)
            }
        }
    }

    fn name(&self) -> &str {
        match &self.mode {
            Mode::Fixture(_) => "fixture",
            Mode::Http { url, .. } => url,
        }
    }
}

/// HTML named entities are not valid XML; map the common ones before parsing.
/// CDATA sections are copied through untouched.
fn scrub_html_entities_for_xml(s: &str) -> String {
    const CDATA_OPEN: &str = "<![CDATA[";
    const CDATA_CLOSE: &str = "]]>";

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&scrub_entities(&rest[..start]));
        let after = &rest[start..];
        match after.find(CDATA_CLOSE) {
            Some(end) => {
                let end = end + CDATA_CLOSE.len();
                out.push_str(&after[..end]);
                rest = &after[end..];
            }
            None => {
                out.push_str(after);
                return out;
            }
        }
    }
    out.push_str(&scrub_entities(rest));
    out
}

fn scrub_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
