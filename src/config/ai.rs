// src/config/ai.rs
use super::{optional_env, require_env, ConfigError};

pub const DEFAULT_DEPLOYMENT: &str = "gpt4-1-translation";
pub const DEFAULT_API_VERSION: &str = "2025-04-01-preview";

/// Connection settings for the Azure OpenAI chat-completions deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl AzureOpenAiConfig {
    /// Reads `AOAI_ENDPOINT` and `AOAI_KEY` (required) plus
    /// `AOAI_DEPLOYMENT` / `AOAI_API_VERSION` (defaulted).
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = require_env("AOAI_ENDPOINT")?;
        let api_key = require_env("AOAI_KEY")?;

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "AOAI_ENDPOINT",
                reason: "expected an http(s) URL".to_string(),
            });
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment: optional_env("AOAI_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            api_version: optional_env("AOAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }

    /// Full chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}
