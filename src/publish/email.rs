// src/publish/email.rs
//! Buttondown email publishing.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const BUTTONDOWN_API_URL: &str = "https://api.buttondown.email/v1/emails";
pub const DEFAULT_SUBJECT: &str = "AI Newsletter";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid API key")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("error making API request: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Draft,
    Published,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    subject: &'a str,
    body: &'a str,
    status: EmailStatus,
    email_type: &'a str,
}

/// Fields of the created email we report back; all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishedEmail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, alias = "absolute_url")]
    pub url: Option<String>,
}

/// Subject line = first line of the body.
pub fn subject_from_body(content: &str) -> &str {
    content
        .trim()
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_SUBJECT)
}

#[derive(Clone)]
pub struct ButtondownClient {
    api_url: String,
    api_key: String,
    client: Client,
}

impl ButtondownClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_url: BUTTONDOWN_API_URL.to_string(),
            api_key,
            client: Client::new(),
        }
    }

    /// Point at a different API root (tests, proxies).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub async fn publish(&self, content: &str, draft: bool) -> Result<PublishedEmail, PublishError> {
        let payload = Payload {
            subject: subject_from_body(content),
            body: content,
            status: if draft {
                EmailStatus::Draft
            } else {
                EmailStatus::Published
            },
            email_type: "public",
        };

        let rsp = self
            .client
            .post(&self.api_url)
            .timeout(Duration::from_secs(30))
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => PublishError::Unauthorized,
                400 => PublishError::BadRequest(body),
                code => PublishError::Http { status: code, body },
            });
        }

        // A 2xx with an unexpected body still counts as published.
        let text = rsp.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }
}
