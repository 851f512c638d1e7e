//! Runtime settings: model selection, pipeline limits, retry policy and
//! transport credentials.
//!
//! Settings load from an optional TOML file and are then overridden from
//! the environment. Secrets are environment-only (`.env` files are loaded
//! by `main` via dotenvy before settings are read).

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Reasoning-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Model identifier sent with every completion call.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; normally injected via `ANTHROPIC_API_KEY`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Output budget for the full analysis call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Output budget for the classification call. Kept tiny: the reply is a
    /// single label word.
    #[serde(default = "default_classification_tokens")]
    pub classification_max_tokens: u32,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_max_output_tokens() -> u32 {
    4096
}
fn default_classification_tokens() -> u32 {
    20
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            max_output_tokens: default_max_output_tokens(),
            classification_max_tokens: default_classification_tokens(),
        }
    }
}

/// Slack credentials, injected via `SLACK_BOT_TOKEN` / `SLACK_SIGNING_SECRET`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackSettings {
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub signing_secret: Option<String>,
}

/// Size limits applied across the pipeline. All values are in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum input text per document before lossy truncation.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// Minimum extracted text for a PDF to count as machine-readable;
    /// below this the original bytes are kept for visual interpretation.
    #[serde(default = "default_min_extracted_chars")]
    pub min_extracted_chars: usize,
    /// Sample size per text document for the classification call.
    #[serde(default = "default_classification_sample_chars")]
    pub classification_sample_chars: usize,
    /// Maximum length of a single outbound message chunk.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_max_input_chars() -> usize {
    180_000
}
fn default_min_extracted_chars() -> usize {
    50
}
fn default_classification_sample_chars() -> usize {
    5_000
}
fn default_max_message_chars() -> usize {
    3_900
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            min_extracted_chars: default_min_extracted_chars(),
            classification_sample_chars: default_classification_sample_chars(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

/// Retry policy values for reasoning-service calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay; attempt N waits N times this before the next try.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_secs() -> u64 {
    5
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }
}

/// Top-level settings object, built once at startup and injected into the
/// components that need it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub slack: SlackSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Settings {
    /// Load settings from an optional TOML file, then apply env overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("invalid config file {}", p.display()))?
            }
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("CLAUDE_MODEL") {
            self.llm.model = model;
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Ok(secret) = std::env::var("SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = Some(secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.limits.max_input_chars, 180_000);
        assert_eq!(settings.limits.min_extracted_chars, 50);
        assert_eq!(settings.limits.classification_sample_chars, 5_000);
        assert_eq!(settings.limits.max_message_chars, 3_900);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.base_delay(), Duration::from_secs(5));
        assert_eq!(settings.llm.classification_max_tokens, 20);
        assert!(settings.llm.model.contains("claude"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "claude-test"

            [limits]
            max_message_chars = 2000
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "claude-test");
        assert_eq!(settings.llm.max_output_tokens, 4096);
        assert_eq!(settings.limits.max_message_chars, 2000);
        assert_eq!(settings.limits.max_input_chars, 180_000);
        assert_eq!(settings.retry.max_attempts, 3);
    }
}
