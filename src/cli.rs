// src/cli.rs
//! `ainews` subcommands. Each stage reads its inputs from files given on the
//! command line and writes its product to stdout or the configured dirs.

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ci;
use crate::config::{ai::AzureOpenAiConfig, require_env, Settings};
use crate::convert;
use crate::extract;
use crate::ingest::{self, providers::rss::RssFeed, FetchOutcome};
use crate::notify::{
    self, discord::DiscordNotifier, slack::SlackNotifier, twitter, Announcement, Notifier, Plan,
};
use crate::publish::{self, email};
use crate::render;
use crate::state::FileMarker;
use crate::translate::{self, client::AzureOpenAiClient, retry::RetryPolicy, retry::TokioSleeper};

/// `summarize` title when the document has no heading.
const SUMMARY_TITLE_FALLBACK: &str = "Japanese AI Newsletter";

#[derive(Debug, Parser)]
#[command(name = "ainews")]
#[command(version)]
#[command(about = "Fetch, translate and publish the AI newsletter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest feed entry if it has not been processed yet
    Fetch,

    /// Convert an issue HTML file to Markdown (stdout)
    Convert { html: PathBuf },

    /// Translate a Markdown file (stdout)
    Translate {
        markdown: PathBuf,
        /// Score the translation with a second completion call
        #[arg(long)]
        quality_check: bool,
    },

    /// Render the email body from metadata and translated content (stdout)
    Render { meta: PathBuf, content: PathBuf },

    /// Publish a rendered email to Buttondown
    Publish {
        email: PathBuf,
        /// Create a draft instead of sending
        #[arg(long)]
        draft: bool,
    },

    /// Write the site page, archive index and feed for one issue
    Site { markdown: PathBuf, date: String },

    /// Print title, date and digest blocks for shell consumption
    Summarize { markdown: PathBuf },

    /// Post the issue digest to Discord
    Discord { markdown: PathBuf, date: String },

    /// Post the issue to X
    Tweet {
        markdown: PathBuf,
        date: String,
        /// Print the post without sending it
        #[arg(long)]
        dry_run: bool,
    },
}

fn read_input(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if text.trim().is_empty() {
        bail!("input file {} is empty", path.display());
    }
    Ok(text)
}

pub async fn run(cli: Cli, settings: &Settings) -> Result<()> {
    match cli.command {
        Command::Fetch => fetch(settings).await,
        Command::Convert { html } => {
            println!("{}", convert::convert_file(&html)?);
            Ok(())
        }
        Command::Translate {
            markdown,
            quality_check,
        } => translate_cmd(settings, &markdown, quality_check).await,
        Command::Render { meta, content } => {
            let template = render::load_template(&settings.template_dir, &settings.template_name);
            let out =
                render::render_files(&template, &meta, &content, Local::now().date_naive())?;
            println!("{out}");
            Ok(())
        }
        Command::Publish { email, draft } => publish_email(&email, draft).await,
        Command::Site { markdown, date } => {
            let md = read_input(&markdown)?;
            let out = publish::publish_site(&md, &date, settings, Utc::now())?;
            println!("Site page: {}", out.page_path.display());
            println!("Archive index: {}", out.index_path.display());
            println!("Feed: {}", out.feed_path.display());
            Ok(())
        }
        Command::Summarize { markdown } => {
            let md = read_input(&markdown)?;
            print!("{}", summary_block(&md));
            Ok(())
        }
        Command::Discord { markdown, date } => discord(settings, &markdown, &date).await,
        Command::Tweet {
            markdown,
            date,
            dry_run,
        } => tweet(settings, &markdown, &date, dry_run).await,
    }
}

async fn fetch(settings: &Settings) -> Result<()> {
    let url = require_env("FEED_URL")?;
    let feed = RssFeed::from_url(url)?;
    let marker = FileMarker::new(&settings.marker_path);

    match ingest::run_fetch(&feed, &marker, &settings.output_dir, Local::now()).await? {
        FetchOutcome::NoNewContent { guid } => {
            println!("No new entries found ({guid}). Skipping...");
            ci::set_output("has_new_content", "false")?;
        }
        FetchOutcome::Processed(entry) => {
            println!("Successfully processed: {}", entry.title);
            println!("GUID: {}", entry.guid);
            println!("Published: {}", entry.published);
            println!(
                "Output files: {}, {}",
                entry.html_path.display(),
                entry.meta_path.display()
            );
            ci::set_output("has_new_content", "true")?;
            ci::set_output("date_prefix", &entry.date_prefix)?;
        }
    }
    Ok(())
}

async fn translate_cmd(settings: &Settings, path: &Path, quality_check: bool) -> Result<()> {
    let cfg = AzureOpenAiConfig::from_env()?;
    let client = AzureOpenAiClient::new(cfg)?;
    let prompt = translate::load_translation_prompt(&settings.prompt_path);
    let policy = RetryPolicy::new(settings.translate_max_attempts);

    let out =
        translate::translate_file(&client, &TokioSleeper, &policy, &prompt, path, quality_check)
            .await?;
    println!("{out}");
    Ok(())
}

async fn publish_email(path: &Path, draft: bool) -> Result<()> {
    let api_key = require_env("BD_API_KEY")?;
    let content = read_input(path)?;

    let sent = email::ButtondownClient::new(api_key)
        .publish(&content, draft)
        .await
        .context("publishing to Buttondown")?;
    info!(
        target: "publish",
        id = sent.id.as_deref().unwrap_or("-"),
        status = sent.status.as_deref().unwrap_or("-"),
        url = sent.url.as_deref().unwrap_or("-"),
        draft,
        "email created"
    );
    println!(
        "Email {}: {}",
        if draft { "draft created" } else { "published" },
        sent.id.as_deref().unwrap_or("(no id)")
    );

    if !draft {
        let slack = SlackNotifier::from_env();
        if slack.is_enabled() {
            let note = published_note(&sent, &content);
            notify::send_best_effort(&slack, &note).await;
        }
    }
    Ok(())
}

/// Slack note for a sent email; the subject Buttondown echoes back wins.
fn published_note(sent: &email::PublishedEmail, content: &str) -> Announcement {
    let title = sent
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| email::subject_from_body(content));
    Announcement {
        title: title.to_string(),
        body: "New newsletter published".to_string(),
        url: sent.url.clone(),
    }
}

/// `TITLE:`/`DATE:` lines followed by the digest between markers.
pub fn summary_block(md: &str) -> String {
    let title = extract::find_title(md).unwrap_or_else(|| SUMMARY_TITLE_FALLBACK.to_string());
    let date = extract::extract_date(md).unwrap_or_else(|| extract::DEFAULT_DATE_LABEL.to_string());
    let digest = extract::paragraph_digest(md, extract::DIGEST_MAX_CHARS);
    format!("TITLE:{title}\nDATE:{date}\nSUMMARY_START\n{digest}\nSUMMARY_END\n")
}

async fn discord(settings: &Settings, path: &Path, date: &str) -> Result<()> {
    let md = read_input(path)?;
    match notify::plan_discord(&md, date, settings) {
        Plan::QuietDay => {
            info!(target: "notify", date, "quiet day, skipping Discord");
            println!("Quiet day detected - skipping Discord post");
        }
        Plan::Post(note) => {
            DiscordNotifier::from_env()?.send(&note).await?;
            println!("Discord notification sent for {date}");
        }
    }
    Ok(())
}

async fn tweet(settings: &Settings, path: &Path, date: &str, dry_run: bool) -> Result<()> {
    let md = read_input(path)?;
    let text = match notify::plan_tweet(&md, date, settings) {
        Plan::QuietDay => {
            info!(target: "notify", date, "quiet day, skipping post");
            println!("Quiet day detected - skipping tweet");
            return Ok(());
        }
        Plan::Post(text) => text,
    };
    println!("Tweet ({} chars): {text}", text.chars().count());
    if dry_run {
        return Ok(());
    }

    let creds = twitter::OAuthCredentials::from_env()?;
    let id = twitter::XClient::new(creds)?.post_tweet(&text).await?;
    println!("Tweet posted successfully: {id}");
    Ok(())
}
