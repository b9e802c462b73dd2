//! Bounded retry with exponential backoff around one completion call.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use super::error::CompletionError;

/// Suspends between attempts. Injected so tests can record backoffs
/// instead of waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, d: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// `2^attempt` seconds, attempt counted from 0.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_secs(1u64 << attempt.min(16))
    }
}

/// Terminal failure: a permanent error, or retries exhausted.
#[derive(Debug, Error)]
#[error("completion failed after {attempts} attempt(s)")]
pub struct RetryFailure {
    pub attempts: u32,
    #[source]
    pub source: CompletionError,
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
/// `op` receives the 0-based attempt number.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CompletionError>>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt + 1 < max => {
                let wait = policy.backoff_for(attempt);
                warn!(
                    target: "translate",
                    attempt = attempt + 1,
                    wait_secs = wait.as_secs(),
                    error = %e,
                    "transient completion failure, backing off"
                );
                sleeper.sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(RetryFailure {
                    attempts: attempt + 1,
                    source: e,
                })
            }
        }
    }
}
