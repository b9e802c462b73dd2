// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::optional_env;

const ENV_PATH: &str = "AINEWS_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/pipeline.toml";

/// Non-secret pipeline settings. Every field has a default, so an absent
/// or partial TOML file is fine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Dedup marker file holding the last processed GUID.
    pub marker_path: PathBuf,
    /// Where the fetch stage writes `<date>_issue.html` / `<date>_meta.json`.
    pub output_dir: PathBuf,
    pub prompt_path: PathBuf,
    pub template_dir: PathBuf,
    pub template_name: String,
    pub site_dir: PathBuf,
    pub site_base_url: String,
    pub site_title: String,
    pub site_description: String,
    pub feed_max_items: usize,
    pub archive_summary_chars: usize,
    pub tweet_summary_chars: usize,
    pub translate_max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marker_path: PathBuf::from("latest.txt"),
            output_dir: PathBuf::from("output"),
            prompt_path: PathBuf::from("prompts/translator.txt"),
            template_dir: PathBuf::from("templates"),
            template_name: "issue.j2".to_string(),
            site_dir: PathBuf::from("docs"),
            site_base_url: "https://yipg.github.io/ainews".to_string(),
            site_title: "AIニュース".to_string(),
            site_description: "英語のAIニュースレターを日本語でお届けします".to_string(),
            feed_max_items: 20,
            archive_summary_chars: 150,
            tweet_summary_chars: 100,
            translate_max_attempts: 3,
        }
    }
}

impl Settings {
    /// Load settings from an explicit TOML path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Load settings using env var + fallbacks:
    /// 1) $AINEWS_CONFIG_PATH
    /// 2) config/pipeline.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(p) = optional_env(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut settings = Self::default();
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = optional_env("SITE_BASE_URL") {
            self.site_base_url = url;
        }
        self.site_base_url = self.site_base_url.trim_end_matches('/').to_string();
        if self.translate_max_attempts == 0 {
            self.translate_max_attempts = 1;
        }
    }

    /// Public URL of the static page for `date_prefix`.
    pub fn page_url(&self, date_prefix: &str) -> String {
        format!("{}/newsletters/{date_prefix}.html", self.site_base_url)
    }
}
