//! Slack Web API collaborator: thread lookup, authenticated file download,
//! threaded replies and event-request signature verification.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const API_BASE: &str = "https://slack.com/api";

/// How many thread messages to scan for attachments.
const THREAD_LOOKBACK: usize = 20;

/// Reject event requests older than this (replay protection).
const MAX_SIGNATURE_AGE_SECS: i64 = 300;

/// Errors from the Slack boundary.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("Slack API error: {0}")]
    Api(String),

    #[error("file download failed: HTTP {0}")]
    Download(u16),
}

/// File metadata as delivered inside Slack events and thread messages.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mimetype: String,
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub url_private: String,
}

#[derive(Deserialize)]
struct RepliesResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    files: Vec<SlackFile>,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

/// Thin client over the Slack Web API methods the bot needs.
pub struct SlackClient {
    http: Client,
    bot_token: String,
}

impl SlackClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            bot_token: bot_token.into(),
        }
    }

    /// Collect files attached anywhere in a thread (bounded lookback).
    pub async fn thread_files(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<SlackFile>, SlackError> {
        let limit = THREAD_LOOKBACK.to_string();
        let response = self
            .http
            .get(format!("{API_BASE}/conversations.replies"))
            .bearer_auth(&self.bot_token)
            .query(&[("channel", channel), ("ts", thread_ts), ("limit", &limit)])
            .send()
            .await
            .map_err(|err| SlackError::Http(err.to_string()))?;

        let parsed: RepliesResponse = response
            .json()
            .await
            .map_err(|err| SlackError::Http(err.to_string()))?;

        if !parsed.ok {
            return Err(SlackError::Api(
                parsed.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        Ok(parsed.messages.into_iter().flat_map(|m| m.files).collect())
    }

    /// Post a message, threaded when `thread_ts` is given.
    pub async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), SlackError> {
        let mut body = serde_json::json!({ "channel": channel, "text": text });
        if let Some(ts) = thread_ts {
            body["thread_ts"] = serde_json::Value::String(ts.to_string());
        }

        let response = self
            .http
            .post(format!("{API_BASE}/chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|err| SlackError::Http(err.to_string()))?;

        let parsed: PostMessageResponse = response
            .json()
            .await
            .map_err(|err| SlackError::Http(err.to_string()))?;

        if !parsed.ok {
            return Err(SlackError::Api(
                parsed.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        Ok(())
    }

    /// Download a file's private content with bearer auth.
    pub async fn download(&self, file: &SlackFile) -> Result<Vec<u8>, SlackError> {
        let response = self
            .http
            .get(&file.url_private)
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .map_err(|err| SlackError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SlackError::Download(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| SlackError::Http(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Verify an Events API request signature (Slack's v0 HMAC-SHA256 scheme).
pub fn verify_signature(signing_secret: &str, timestamp: &str, body: &str, signature: &str) -> bool {
    verify_signature_at(
        signing_secret,
        timestamp,
        body,
        signature,
        Utc::now().timestamp(),
    )
}

fn verify_signature_at(
    signing_secret: &str,
    timestamp: &str,
    body: &str,
    signature: &str,
    now: i64,
) -> bool {
    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now - ts).abs() > MAX_SIGNATURE_AGE_SECS {
        return false;
    }

    let Some(provided) = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("v0:{timestamp}:{body}").as_bytes());
    mac.verify_slice(&provided).is_ok()
}
