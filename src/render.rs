// src/render.rs
//! Email body rendering: metadata + translated Markdown through a Jinja template.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use minijinja::{context, Environment};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::ingest::types::EntryMetadata;

pub const FALLBACK_TEMPLATE: &str = "{{ title }}

{{ content }}

---

元記事: {{ original_link }}
発行日: {{ published_date }}
";

/// Which template the renderer ended up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Loaded(String),
    Fallback,
}

impl TemplateSource {
    pub fn source(&self) -> &str {
        match self {
            Self::Loaded(s) => s,
            Self::Fallback => FALLBACK_TEMPLATE,
        }
    }
}

/// Read and parse `<dir>/<name>`; any failure selects the built-in template.
pub fn load_template(dir: &Path, name: &str) -> TemplateSource {
    let path = dir.join(name);
    let source = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            warn!(target: "render", path = %path.display(), error = %e, "template unavailable, using fallback");
            return TemplateSource::Fallback;
        }
    };
    let env = Environment::new();
    if let Err(e) = env.template_from_str(&source) {
        warn!(target: "render", path = %path.display(), error = %e, "template does not parse, using fallback");
        return TemplateSource::Fallback;
    }
    TemplateSource::Loaded(source)
}

/// Feed dates → `YYYY年MM月DD日`. Unparseable input is returned unchanged.
pub fn format_date(date_str: &str) -> String {
    let s = date_str.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.format("%Y年%m月%d日").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.format("%Y年%m月%d日").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
        return dt.format("%Y年%m月%d日").to_string();
    }
    date_str.to_string()
}

pub fn load_metadata(path: &Path) -> Result<EntryMetadata> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading metadata {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing metadata JSON {}", path.display()))
}

pub fn render_email(
    template: &TemplateSource,
    meta: &EntryMetadata,
    content: &str,
    today: NaiveDate,
) -> Result<String> {
    let env = Environment::new();
    let rendered = env
        .render_str(
            template.source(),
            context! {
                title => &meta.title,
                content => content,
                original_link => &meta.link,
                published_date => format_date(&meta.published),
                author => &meta.author,
                tags => &meta.tags,
                guid => &meta.guid,
                processed_at => &meta.processed_at,
                current_date => today.format("%Y年%m月%d日").to_string(),
            },
        )
        .context("rendering email template")?;
    Ok(rendered)
}

/// Render the email for a metadata file and a translated Markdown file.
pub fn render_files(
    template: &TemplateSource,
    meta_path: &Path,
    content_path: &Path,
    today: NaiveDate,
) -> Result<String> {
    let meta = load_metadata(meta_path)?;
    let content = fs::read_to_string(content_path)
        .with_context(|| format!("reading content {}", content_path.display()))?;
    if content.trim().is_empty() {
        bail!("content file {} is empty", content_path.display());
    }
    render_email(template, &meta, &content, today)
}
