//! Chat-completion client: provider abstraction + Azure OpenAI implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::CompletionError;
use crate::config::ai::AzureOpenAiConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// One request/response exchange with the completion API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the first choice's text. Empty completions are `EmptyResponse`.
    async fn complete(&self, req: &CompletionRequest) -> Result<String, CompletionError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Azure OpenAI chat completions (deployment in path, `api-key` header).
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    cfg: AzureOpenAiConfig,
}

impl AzureOpenAiClient {
    pub fn new(cfg: AzureOpenAiConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ainews-pipeline/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            // Long newsletters take minutes to translate.
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self { http, cfg })
    }
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, CompletionError> {
        let resp = self
            .http
            .post(self.cfg.completions_url())
            .header("api-key", &self.cfg.api_key)
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::from_status(status.as_u16(), body));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "azure-openai"
    }
}
