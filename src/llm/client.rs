//! Anthropic messages API client.
//!
//! Request content is an ordered, tagged sequence of text and document
//! blocks so scanned PDFs travel alongside extracted text in one call.
//! The response's text portions are concatenated in order.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmSettings;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// One entry in the ordered content sequence sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Document { source: DocumentSource },
}

/// Base64 payload for a document block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Document block carrying the original bytes for visual interpretation.
    pub fn document(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::Document {
            source: DocumentSource {
                kind: "base64".to_string(),
                media_type: media_type.into(),
                data: BASE64.encode(bytes),
            },
        }
    }
}

/// A single completion request: system instructions plus ordered content.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub content: Vec<ContentBlock>,
    pub max_tokens: u32,
}

/// Errors from the reasoning-service boundary.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream stayed overloaded through every retry attempt.
    #[error("reasoning service overloaded after {attempts} attempts")]
    Overloaded { attempts: u32 },

    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to parse API response: {0}")]
    Parse(String),

    #[error("missing API key (set ANTHROPIC_API_KEY)")]
    MissingApiKey,
}

impl LlmError {
    /// Transient-overload signatures worth retrying: capacity status codes
    /// and the explicit overloaded error code. Everything else, including
    /// connection failures, is treated as permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Api { status, code, .. } => {
                matches!(*status, 529 | 502 | 503) || code.as_deref() == Some("overloaded_error")
            }
            _ => false,
        }
    }
}

/// Outbound reasoning-service boundary. A trait so the pipeline can run
/// against a scripted fake in tests.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a [ContentBlock],
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

/// HTTP client for the Anthropic messages API.
pub struct ClaudeClient {
    http: Client,
    model: String,
    api_key: String,
}

impl ClaudeClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|err| LlmError::Connection(err.to_string()))?;

        Ok(Self {
            http,
            model: settings.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ReasoningService for ClaudeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = ApiRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: vec![ApiMessage {
                role: "user",
                content: &request.content,
            }],
        };

        tracing::debug!(
            model = %self.model,
            blocks = request.content.len(),
            max_tokens = request.max_tokens,
            "sending completion request"
        );

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::Connection(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<ApiErrorEnvelope>(&text) {
                Ok(envelope) => (
                    envelope.error.kind,
                    envelope.error.message.unwrap_or_default(),
                ),
                Err(_) => (None, text),
            };
            return Err(LlmError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|err| LlmError::Parse(err.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }
}
