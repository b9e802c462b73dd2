// src/publish/site.rs
//! Static site publishing: per-date HTML page, archive index, feed.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, Options, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::archive::{ArchiveEntry, ArchiveIndex};
use super::feed::{build_feed, FeedChannel};
use crate::config::Settings;
use crate::extract;

/// Render Markdown to an HTML fragment.
pub fn markdown_to_html(md: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(md, opts);
    let mut out = String::with_capacity(md.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

pub struct PageContext<'a> {
    pub title: &'a str,
    pub date: &'a str,
    pub summary: &'a str,
    pub body_html: &'a str,
    pub base_url: &'a str,
    pub site_title: &'a str,
}

const PAGE_STYLE: &str = r#"
    :root { --fg: #1f2328; --muted: #59636e; --accent: #0969da; --bg: #ffffff; --rule: #d1d9e0; }
    * { box-sizing: border-box; }
    body { margin: 0; background: var(--bg); color: var(--fg);
           font-family: "Hiragino Sans", "Noto Sans JP", "Yu Gothic", system-ui, sans-serif;
           line-height: 1.8; }
    main { max-width: 760px; margin: 0 auto; padding: 2rem 1.25rem 4rem; }
    header.site { border-bottom: 1px solid var(--rule); margin-bottom: 2rem; padding-bottom: 1rem; }
    header.site a { color: var(--muted); text-decoration: none; font-size: .9rem; }
    .date { color: var(--muted); font-size: .9rem; }
    h1, h2, h3 { line-height: 1.4; }
    a { color: var(--accent); }
    img { max-width: 100%; height: auto; }
    blockquote { margin: 1rem 0; padding: .25rem 1rem; border-left: 4px solid var(--rule); color: var(--muted); }
    pre { overflow-x: auto; background: #f6f8fa; padding: 1rem; border-radius: 6px; }
    table { border-collapse: collapse; }
    td, th { border: 1px solid var(--rule); padding: .25rem .5rem; }
    footer { margin-top: 3rem; border-top: 1px solid var(--rule); padding-top: 1rem; color: var(--muted); font-size: .85rem; }
"#;

/// Wrap rendered Markdown in a standalone page with OG/Twitter meta tags.
pub fn render_page(ctx: &PageContext<'_>) -> String {
    let page_url = format!("{}/newsletters/{}.html", ctx.base_url, ctx.date);
    let og_image = format!("{}/og/{}.png", ctx.base_url, ctx.date);
    let title_attr = encode_double_quoted_attribute(ctx.title);
    let summary_attr = encode_double_quoted_attribute(ctx.summary);

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | {site}</title>
  <meta name="description" content="{summary_attr}">
  <meta property="og:type" content="article">
  <meta property="og:title" content="{title_attr}">
  <meta property="og:description" content="{summary_attr}">
  <meta property="og:url" content="{page_url}">
  <meta property="og:image" content="{og_image}">
  <meta name="twitter:card" content="summary_large_image">
  <meta name="twitter:title" content="{title_attr}">
  <meta name="twitter:description" content="{summary_attr}">
  <meta name="twitter:image" content="{og_image}">
  <link rel="alternate" type="application/rss+xml" title="{site}" href="{base}/feed.xml">
  <style>{style}</style>
</head>
<body>
  <main>
    <header class="site"><a href="{base}/">← {site}</a></header>
    <article>
      <p class="date">{date}</p>
{body}
    </article>
    <footer>{site}</footer>
  </main>
</body>
</html>
"#,
        title = encode_text(ctx.title),
        site = encode_text(ctx.site_title),
        date = encode_text(ctx.date),
        base = ctx.base_url,
        style = PAGE_STYLE,
        body = ctx.body_html,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePublication {
    pub page_path: PathBuf,
    pub index_path: PathBuf,
    pub feed_path: PathBuf,
    pub entry: ArchiveEntry,
}

/// Publish translated Markdown for `date` into the site tree.
///
/// Writes `newsletters/<date>.html`, upserts `newsletters/index.json` and
/// regenerates `feed.xml` from the index.
pub fn publish_site(
    md: &str,
    date: &str,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<SitePublication> {
    if md.trim().is_empty() {
        bail!("translated content is empty");
    }
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        bail!("date {date:?} is not in YYYY-MM-DD form");
    }
    let site_dir: &Path = &settings.site_dir;
    let pages_dir = site_dir.join("newsletters");
    fs::create_dir_all(&pages_dir)
        .with_context(|| format!("creating {}", pages_dir.display()))?;

    // Load first: a corrupt index must fail the run before anything is written.
    let index_path = pages_dir.join("index.json");
    let mut index = ArchiveIndex::load(&index_path)?;

    let title = extract::extract_title(md);
    let summary = extract::archive_summary(md, settings.archive_summary_chars);
    let filename = format!("{date}.html");

    let body_html = markdown_to_html(md);
    let page = render_page(&PageContext {
        title: &title,
        date,
        summary: &summary,
        body_html: &body_html,
        base_url: &settings.site_base_url,
        site_title: &settings.site_title,
    });
    let page_path = pages_dir.join(&filename);
    fs::write(&page_path, page).with_context(|| format!("writing {}", page_path.display()))?;

    let entry = ArchiveEntry {
        date: date.to_string(),
        title,
        summary,
        filename,
    };
    index.upsert(entry.clone(), now);
    index.save(&index_path)?;

    let feed = build_feed(
        &index,
        &FeedChannel {
            title: &settings.site_title,
            base_url: &settings.site_base_url,
            description: &settings.site_description,
        },
        settings.feed_max_items,
        now,
    )?;
    let feed_path = site_dir.join("feed.xml");
    fs::write(&feed_path, feed).with_context(|| format!("writing {}", feed_path.display()))?;

    info!(
        target: "site",
        date,
        page = %page_path.display(),
        total = index.total_count,
        "site updated"
    );

    Ok(SitePublication {
        page_path,
        index_path,
        feed_path,
        entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_renders_tables_and_links() {
        let out = markdown_to_html("# 見出し\n\n[link](https://x.example)\n\n|a|b|\n|-|-|\n|1|2|");
        assert!(out.contains("<h1>見出し</h1>"));
        assert!(out.contains(r#"<a href="https://x.example">link</a>"#));
        assert!(out.contains("<table>"));
    }

    #[test]
    fn page_escapes_metadata() {
        let page = render_page(&PageContext {
            title: r#"A "quoted" <title>"#,
            date: "2025-07-17",
            summary: "s",
            body_html: "<p>body</p>",
            base_url: "https://example.org",
            site_title: "AIニュース",
        });
        assert!(page.contains("<title>A \"quoted\" &lt;title&gt; | AIニュース</title>"));
        assert!(page.contains(r#"content="A &quot;quoted&quot; &lt;title&gt;""#));
        assert!(page.contains(r#"content="https://example.org/og/2025-07-17.png""#));
        assert!(page.contains("<p>body</p>"));
    }
}
