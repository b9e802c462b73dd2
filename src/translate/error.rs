//! Completion API error classification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP 429 from the completion endpoint.
    #[error("rate limit exceeded (HTTP 429): {0}")]
    RateLimited(String),
    #[error("completion API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("empty response from completion API")]
    EmptyResponse,
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode completion response: {0}")]
    Decode(String),
}

impl CompletionError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            429 => Self::RateLimited(body.into()),
            _ => Self::Http {
                status,
                body: body.into(),
            },
        }
    }

    /// Only rate limiting and empty completions are worth another attempt.
    /// Auth failures, bad requests and other statuses are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::EmptyResponse)
    }
}
