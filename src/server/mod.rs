//! Slack Events API server.
//!
//! A single endpoint, `POST /slack/events`, handles the url_verification
//! handshake and dispatches app_mention events to the analysis pipeline.
//! Each mention runs in its own spawned task so the endpoint can
//! acknowledge within Slack's response deadline.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::extract::{self, ContentExtractor};
use crate::llm::{ClaudeClient, LlmError};
use crate::models::RawFile;
use crate::services::{AnalysisError, AnalysisService};
use crate::slack::{verify_signature, SlackClient, SlackError, SlackFile};
use crate::utils::split_message;

const MSG_NO_FILES: &str = "Não encontrei nenhum documento nesta thread. Envie um PDF ou DOCX e me mencione novamente.";
const MSG_NO_SUPPORTED: &str = "Encontrei arquivos na thread, mas nenhum em formato suportado (PDF, DOCX, DOC, TXT). Por favor, envie o documento em um desses formatos.";
const MSG_NO_CONTENT: &str = "Não consegui extrair conteúdo dos documentos. O arquivo pode estar corrompido. Tente enviar novamente.";
const MSG_OVERLOADED: &str = "⏳ Os servidores da Anthropic (Claude) estão com alto tráfego neste momento. Tentei 3 vezes mas não consegui processar. Tente novamente em alguns minutos.";
const MSG_GENERIC_FAILURE: &str = "Ocorreu um erro ao processar o documento. Tente novamente em alguns instantes.";

/// Shared state for the event server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub slack: Arc<SlackClient>,
    pub analysis: Arc<AnalysisService>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let bot_token = settings
            .slack
            .bot_token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("SLACK_BOT_TOKEN is not set"))?;
        let client = ClaudeClient::new(&settings.llm)?;
        let analysis = AnalysisService::new(Arc::new(client), settings.clone());

        Ok(Self {
            settings: Arc::new(settings),
            slack: Arc::new(SlackClient::new(bot_token)),
            analysis: Arc::new(analysis),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/slack/events", post(handle_event))
        .with_state(state)
}

/// Start the event server.
pub async fn serve(settings: Settings, bind: &str) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: std::net::SocketAddr = bind.parse()?;
    info!("listening for Slack events at http://{}/slack/events", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    challenge: Option<String>,
    event: Option<MentionEvent>,
}

#[derive(Debug, Clone, Deserialize)]
struct MentionEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    ts: String,
    thread_ts: Option<String>,
    #[serde(default)]
    files: Vec<SlackFile>,
}

async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    if let Some(secret) = state.settings.slack.signing_secret.as_deref() {
        let timestamp = header_str(&headers, "x-slack-request-timestamp");
        let signature = header_str(&headers, "x-slack-signature");
        if !verify_signature(secret, timestamp, &body, signature) {
            warn!("rejected Slack event with bad signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "bad signature" })),
            );
        }
    }

    let envelope: EventEnvelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!("unparseable Slack event: {}", err);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "bad payload" })),
            );
        }
    };

    match envelope.kind.as_str() {
        "url_verification" => {
            let challenge = envelope.challenge.unwrap_or_default();
            (StatusCode::OK, Json(json!({ "challenge": challenge })))
        }
        "event_callback" => {
            if let Some(event) = envelope.event {
                if event.kind == "app_mention" {
                    // Ack immediately; Slack retries events on slow responses.
                    let state = state.clone();
                    tokio::spawn(async move { handle_mention(state, event).await });
                }
            }
            (StatusCode::OK, Json(json!({ "ok": true })))
        }
        _ => (StatusCode::OK, Json(json!({ "ok": true }))),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

#[derive(Debug, thiserror::Error)]
enum MentionError {
    #[error(transparent)]
    Slack(#[from] SlackError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

async fn handle_mention(state: AppState, event: MentionEvent) {
    let request_id = Uuid::new_v4();
    let thread_ts = event.thread_ts.clone().unwrap_or_else(|| event.ts.clone());
    info!(%request_id, channel = %event.channel, "handling mention");

    if let Err(err) = run_mention(&state, &event, &thread_ts).await {
        error!(%request_id, "mention processing failed: {}", err);
        let message = match &err {
            MentionError::Analysis(AnalysisError::Llm(LlmError::Overloaded { .. })) => {
                MSG_OVERLOADED
            }
            MentionError::Analysis(AnalysisError::NothingToAnalyze) => MSG_NO_CONTENT,
            _ => MSG_GENERIC_FAILURE,
        };
        if let Err(post_err) = state
            .slack
            .post_message(&event.channel, Some(&thread_ts), message)
            .await
        {
            error!(%request_id, "failed to report failure to thread: {}", post_err);
        }
    }
}

async fn run_mention(
    state: &AppState,
    event: &MentionEvent,
    thread_ts: &str,
) -> Result<(), MentionError> {
    let slack = &state.slack;

    // Files on the mention itself win; otherwise scan the thread.
    let mut files = event.files.clone();
    if files.is_empty() {
        if let Some(parent_ts) = &event.thread_ts {
            files = slack.thread_files(&event.channel, parent_ts).await?;
        }
    }

    if files.is_empty() {
        slack
            .post_message(&event.channel, Some(thread_ts), MSG_NO_FILES)
            .await?;
        return Ok(());
    }

    let supported: Vec<SlackFile> = files
        .into_iter()
        .filter(|file| extract::is_supported(&file.filetype, &file.mimetype))
        .collect();

    if supported.is_empty() {
        slack
            .post_message(&event.channel, Some(thread_ts), MSG_NO_SUPPORTED)
            .await?;
        return Ok(());
    }

    slack
        .post_message(
            &event.channel,
            Some(thread_ts),
            &format!(
                "Analisando {} documento(s)... Isso pode levar alguns segundos.",
                supported.len()
            ),
        )
        .await?;

    // Download and extract concurrently; per-file failures degrade to
    // placeholders and the batch proceeds.
    let extractor = ContentExtractor::new(state.settings.limits.min_extracted_chars);
    let documents = futures::future::join_all(supported.iter().map(|file| {
        let extractor = &extractor;
        async move {
            match slack.download(file).await {
                Ok(bytes) => extractor.extract(RawFile {
                    name: file.name.clone(),
                    mime_type: file.mimetype.clone(),
                    filetype: file.filetype.clone(),
                    bytes,
                }),
                Err(err) => {
                    warn!("download failed for {}: {}", file.name, err);
                    extract::failed_placeholder(&file.name, &file.filetype)
                }
            }
        }
    }))
    .await;

    let report = state.analysis.analyze(documents).await?;

    for chunk in split_message(&report.text, state.settings.limits.max_message_chars) {
        slack
            .post_message(&event.channel, Some(thread_ts), &chunk)
            .await?;
    }
    Ok(())
}
