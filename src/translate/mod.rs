// src/translate/mod.rs
//! Translation stage: Markdown in, Japanese Markdown out, with an optional
//! second completion call that scores the translation.

pub mod client;
pub mod error;
pub mod retry;

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use self::client::{ChatMessage, CompletionClient, CompletionRequest};
use self::retry::{retry_with_backoff, RetryFailure, RetryPolicy, Sleeper};

/// Scores at or above this are considered high quality.
pub const HIGH_QUALITY_THRESHOLD: f32 = 0.95;

pub const DEFAULT_TRANSLATION_PROMPT: &str = "あなたはバイリンガル編集者です。入力はMarkdownの英語ニュースレターです。以下のルールで日本語に翻訳してください。
- 見出しは全角。
- 固有名詞・社名は原文のまま。
- 箇条書きはMarkdownのまま保持。
- 口語ではなく、ビジネス向けの丁寧体。";

const QUALITY_PROMPT: &str = "あなたは翻訳品質評価の専門家です。以下の英語原文と日本語翻訳を比較して、翻訳品質を0.0から1.0のスコアで評価してください。

評価基準：
- 文章の欠落や追加がないか
- 意味が正確に伝わっているか
- 幻覚（hallucination）がないか
- 自然な日本語表現になっているか

0.95以上で高品質とします。数値のみで回答してください。

原文：
{original}

翻訳：
{translated}

スコア：";

/// Where the system prompt came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Loaded(String),
    Fallback,
}

impl PromptSource {
    pub fn text(&self) -> &str {
        match self {
            Self::Loaded(s) => s,
            Self::Fallback => DEFAULT_TRANSLATION_PROMPT,
        }
    }
}

/// Read the system prompt, falling back to the built-in one when the file
/// is missing, unreadable or blank.
pub fn load_translation_prompt(path: &Path) -> PromptSource {
    match fs::read_to_string(path) {
        Ok(s) if !s.trim().is_empty() => PromptSource::Loaded(s.trim().to_string()),
        Ok(_) => {
            warn!(target: "translate", path = %path.display(), "prompt file is blank, using built-in prompt");
            PromptSource::Fallback
        }
        Err(e) => {
            warn!(target: "translate", path = %path.display(), error = %e, "prompt file unavailable, using built-in prompt");
            PromptSource::Fallback
        }
    }
}

/// Low temperature, large output budget.
pub fn translation_request(system_prompt: &str, content: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(content)],
        temperature: 0.2,
        max_tokens: 16_384,
        top_p: Some(1.0),
        frequency_penalty: Some(0.0),
        presence_penalty: Some(0.0),
    }
}

pub fn quality_request(original: &str, translated: &str) -> CompletionRequest {
    let prompt = QUALITY_PROMPT
        .replace("{original}", original)
        .replace("{translated}", translated);
    CompletionRequest {
        messages: vec![ChatMessage::user(prompt)],
        temperature: 0.1,
        max_tokens: 100,
        top_p: None,
        frequency_penalty: None,
        presence_penalty: None,
    }
}

/// Translate with retry. Returns the trimmed completion.
pub async fn translate(
    client: &dyn CompletionClient,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    system_prompt: &str,
    content: &str,
) -> Result<String, RetryFailure> {
    let req = translation_request(system_prompt, content);
    let out = retry_with_backoff(policy, sleeper, |_| client.complete(&req)).await?;
    Ok(out.trim().to_string())
}

/// Parse the model's bare numeric answer. Anything else scores 0.0.
pub fn parse_quality_score(text: &str) -> f32 {
    match text.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Score a translation in [0.0, 1.0]. Never fails: call errors map to 0.0.
pub async fn quality_check(client: &dyn CompletionClient, original: &str, translated: &str) -> f32 {
    match client.complete(&quality_request(original, translated)).await {
        Ok(text) => {
            let score = parse_quality_score(&text);
            if score == 0.0 && text.trim().parse::<f32>().is_err() {
                warn!(target: "translate", output = %text.trim(), "invalid score format");
            }
            score
        }
        Err(e) => {
            warn!(target: "translate", error = %e, "quality check failed");
            0.0
        }
    }
}

/// Translate the Markdown file at `path`, optionally scoring the result.
pub async fn translate_file(
    client: &dyn CompletionClient,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    prompt: &PromptSource,
    path: &Path,
    with_quality_check: bool,
) -> Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if content.trim().is_empty() {
        bail!("Markdown file {} is empty", path.display());
    }

    info!(
        target: "translate",
        provider = client.provider_name(),
        chars = content.chars().count(),
        prompt = if matches!(prompt, PromptSource::Loaded(_)) { "file" } else { "built-in" },
        "translating content"
    );
    let translated = translate(client, sleeper, policy, prompt.text(), &content)
        .await
        .context("translation failed")?;

    if with_quality_check {
        let score = quality_check(client, &content, &translated).await;
        if score >= HIGH_QUALITY_THRESHOLD {
            info!(target: "translate", score, "translation quality check passed");
        } else {
            warn!(target: "translate", score, threshold = HIGH_QUALITY_THRESHOLD, "translation quality below threshold");
        }
    }

    Ok(translated)
}
