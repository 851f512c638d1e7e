//! Local-file analysis commands.
//!
//! These run the same pipeline the Slack server uses, over files read from
//! disk, which keeps the bot testable without a workspace install.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use console::style;

use crate::config::Settings;
use crate::extract::ContentExtractor;
use crate::llm::ClaudeClient;
use crate::models::{NormalizedDocument, RawFile};
use crate::services::AnalysisService;

pub async fn analyze(settings: Settings, files: &[PathBuf]) -> anyhow::Result<()> {
    let documents = load_documents(&settings, files).await?;
    let service = build_service(settings)?;

    let report = service.analyze(documents).await?;
    println!("{}", report.text);
    Ok(())
}

pub async fn classify(settings: Settings, files: &[PathBuf]) -> anyhow::Result<()> {
    let documents = load_documents(&settings, files).await?;
    let service = build_service(settings)?;

    let doc_type = service.classify(&documents).await?;
    println!("{} {}", style("Tipo:").bold(), doc_type.display_name());
    Ok(())
}

fn build_service(settings: Settings) -> anyhow::Result<AnalysisService> {
    let client = ClaudeClient::new(&settings.llm)?;
    Ok(AnalysisService::new(Arc::new(client), settings))
}

async fn load_documents(
    settings: &Settings,
    files: &[PathBuf],
) -> anyhow::Result<Vec<NormalizedDocument>> {
    anyhow::ensure!(!files.is_empty(), "no input files given");

    let extractor = ContentExtractor::new(settings.limits.min_extracted_chars);
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        eprintln!("{} {}", style("Lendo").dim(), path.display());
        let raw = read_raw_file(path).await?;
        documents.push(extractor.extract(raw));
    }
    Ok(documents)
}

/// Build a RawFile from a local path, resolving the MIME type from the
/// extension and falling back to content sniffing.
async fn read_raw_file(path: &Path) -> anyhow::Result<RawFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let filetype = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .map(|mime| mime.to_string())
        .or_else(|| infer::get(&bytes).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(RawFile {
        name,
        mime_type,
        filetype,
        bytes,
    })
}
