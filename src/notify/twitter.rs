// src/notify/twitter.rs
//! X (Twitter) v2 posting with OAuth 1.0a user-context signing.

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distr::Alphanumeric, Rng};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use std::time::Duration;

use crate::config::{require_env, ConfigError};

type HmacSha1 = Hmac<Sha1>;

pub const X_API_BASE: &str = "https://api.twitter.com";

#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl OAuthCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            consumer_key: require_env("TWITTER_API_KEY")?,
            consumer_secret: require_env("TWITTER_API_SECRET")?,
            access_token: require_env("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: require_env("TWITTER_ACCESS_TOKEN_SECRET")?,
        })
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key_len", &self.consumer_key.len())
            .field("access_token_len", &self.access_token.len())
            .finish_non_exhaustive()
    }
}

/// RFC 3986 encoding: everything but `A-Za-z0-9-._~`.
fn enc(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// HMAC-SHA1 signature over method, URL and the sorted parameter set.
///
/// `extra` carries query/form parameters; JSON bodies are not signed.
pub fn sign(
    creds: &OAuthCredentials,
    method: &str,
    url: &str,
    nonce: &str,
    timestamp: i64,
    extra: &[(&str, &str)],
) -> Result<String> {
    let ts = timestamp.to_string();
    let mut params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), enc(&creds.consumer_key)),
        ("oauth_nonce".into(), enc(nonce)),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), ts),
        ("oauth_token".into(), enc(&creds.access_token)),
        ("oauth_version".into(), "1.0".into()),
    ];
    params.extend(extra.iter().map(|(k, v)| (enc(k), enc(v))));
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        enc(url),
        enc(&param_string)
    );
    let key = format!(
        "{}&{}",
        enc(&creds.consumer_secret),
        enc(&creds.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| anyhow!("initialising HMAC-SHA1: {e}"))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// `Authorization: OAuth ...` header value for a request without signed
/// parameters beyond the protocol ones.
pub fn authorization_header(
    creds: &OAuthCredentials,
    method: &str,
    url: &str,
    nonce: &str,
    timestamp: i64,
) -> Result<String> {
    let signature = sign(creds, method, url, nonce, timestamp, &[])?;
    let ts = timestamp.to_string();
    let fields = [
        ("oauth_consumer_key", creds.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature", signature.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", ts.as_str()),
        ("oauth_token", creds.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];
    let joined = fields
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", enc(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {joined}"))
}

fn nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

pub struct XClient {
    base_url: String,
    creds: OAuthCredentials,
    client: Client,
}

impl XClient {
    pub fn new(creds: OAuthCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ainews/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building X HTTP client")?;
        Ok(Self {
            base_url: X_API_BASE.to_string(),
            creds,
            client,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a post; returns its id.
    pub async fn post_tweet(&self, text: &str) -> Result<String> {
        let url = format!("{}/2/tweets", self.base_url);
        let auth = authorization_header(
            &self.creds,
            "POST",
            &url,
            &nonce(),
            chrono::Utc::now().timestamp(),
        )?;

        let rsp = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .context("X API request failed")?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            bail!("X API returned {status}: {body}");
        }
        let parsed: TweetResponse = rsp.json().await.context("decoding X API response")?;
        tracing::info!(target: "notify", id = %parsed.data.id, "post created");
        Ok(parsed.data.id)
    }
}
