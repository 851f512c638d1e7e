//! Document analysis pipeline.
//!
//! Runs a normalized document batch through truncation, classification,
//! instruction selection, content assembly, the model call and report
//! rendering. Both completion calls go through the uniform retry policy.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::llm::{prompts, CompletionRequest, ContentBlock, LlmError, ReasoningService, RetryPolicy};
use crate::models::{DocumentContent, DocumentType, NormalizedDocument};
use crate::utils::truncate_chars;

/// Fixed-form notice rendered when any document took the scanned path.
const SCANNED_NOTICE: &str = "🔎 *Um ou mais documentos foram enviados sem camada de texto (PDF digitalizado) e foram interpretados visualmente. A qualidade da análise pode variar.*\n\n";

/// Fixed-form notice appended when input was truncated.
const TRUNCATED_NOTICE: &str = "\n\n⚠️ *O documento foi truncado por ser muito extenso. A análise cobre apenas a parte inicial.*";

const CLASSIFICATION_PREFIX: &str = "Classifique este documento:";

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Every file degraded during extraction; there is nothing worth
    /// sending to the model.
    #[error("no usable content in the document batch")]
    NothingToAnalyze,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Final report for a batch. Held only until the reply is dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub doc_type: DocumentType,
    pub text: String,
}

/// Lossy-handling flags accumulated while preparing the batch, disclosed
/// to the reader in the rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFlags {
    pub truncated: bool,
    pub had_binary_fallback: bool,
}

/// The pipeline service. One instance serves all requests; every run owns
/// its batch and produces an independent report.
pub struct AnalysisService {
    service: Arc<dyn ReasoningService>,
    settings: Settings,
    retry: RetryPolicy,
}

impl AnalysisService {
    pub fn new(service: Arc<dyn ReasoningService>, settings: Settings) -> Self {
        let retry = RetryPolicy::new(settings.retry.max_attempts, settings.retry.base_delay());
        Self {
            service,
            settings,
            retry,
        }
    }

    /// Run the full pipeline over an extracted batch.
    pub async fn analyze(
        &self,
        mut documents: Vec<NormalizedDocument>,
    ) -> Result<AnalysisReport, AnalysisError> {
        if !documents.iter().any(NormalizedDocument::is_usable) {
            return Err(AnalysisError::NothingToAnalyze);
        }

        let mut flags = ReportFlags {
            truncated: false,
            had_binary_fallback: documents.iter().any(NormalizedDocument::is_binary),
        };
        flags.truncated = truncate_batch(&mut documents, self.settings.limits.max_input_chars);

        let doc_type = self.classify(&documents).await?;
        info!("batch classified as {}", doc_type.as_str());

        let prompt = prompts::select(doc_type);
        let content = assemble(&documents, prompt.user_prefix);
        let report = self
            .retry
            .run(|| {
                self.service.complete(CompletionRequest {
                    system: prompt.system.to_string(),
                    content: content.clone(),
                    max_tokens: self.settings.llm.max_output_tokens,
                })
            })
            .await?;

        Ok(AnalysisReport {
            doc_type,
            text: render(doc_type, &report, flags),
        })
    }

    /// Classify a batch with a cheap sampled call.
    pub async fn classify(
        &self,
        documents: &[NormalizedDocument],
    ) -> Result<DocumentType, AnalysisError> {
        if !documents.iter().any(NormalizedDocument::is_usable) {
            return Err(AnalysisError::NothingToAnalyze);
        }

        let sampled = sample_for_classification(
            documents,
            self.settings.limits.classification_sample_chars,
        );
        let content = assemble(&sampled, CLASSIFICATION_PREFIX);
        let reply = self
            .retry
            .run(|| {
                self.service.complete(CompletionRequest {
                    system: prompts::CLASSIFICATION_PROMPT.to_string(),
                    content: content.clone(),
                    max_tokens: self.settings.llm.classification_max_tokens,
                })
            })
            .await?;

        debug!("classification reply: {:?}", reply);
        Ok(DocumentType::from_reply(&reply))
    }
}

/// Truncate oversized text documents in place. Returns whether anything
/// was cut, so the renderer can disclose the loss.
fn truncate_batch(documents: &mut [NormalizedDocument], max_chars: usize) -> bool {
    let mut truncated = false;
    for doc in documents.iter_mut() {
        if let DocumentContent::Text(text) = &mut doc.content {
            if text.chars().count() > max_chars {
                *text = truncate_chars(text, max_chars).to_string();
                truncated = true;
            }
        }
    }
    truncated
}

/// Reduced copies for the classification call: text documents sampled down,
/// binary documents included whole since no textual sample exists.
fn sample_for_classification(
    documents: &[NormalizedDocument],
    sample_chars: usize,
) -> Vec<NormalizedDocument> {
    documents
        .iter()
        .map(|doc| match &doc.content {
            DocumentContent::Text(text) => {
                NormalizedDocument::text(doc.name.clone(), truncate_chars(text, sample_chars))
            }
            other => NormalizedDocument {
                name: doc.name.clone(),
                content: other.clone(),
            },
        })
        .collect()
}

/// Build the ordered content sequence for a batch.
///
/// A binary document is followed immediately by a caption block naming the
/// file, so the model can tell which attachment is which. Text and
/// placeholder documents get a single block with a file-delimiter header.
pub fn assemble(documents: &[NormalizedDocument], prefix: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    if !prefix.is_empty() {
        blocks.push(ContentBlock::text(prefix));
    }

    for doc in documents {
        match &doc.content {
            DocumentContent::Binary { media_type, bytes } => {
                blocks.push(ContentBlock::document(media_type.clone(), bytes));
                blocks.push(ContentBlock::text(format!(
                    "--- Arquivo: {} (anexado acima) ---",
                    doc.name
                )));
            }
            DocumentContent::Text(text) => {
                blocks.push(ContentBlock::text(format!(
                    "--- Arquivo: {} ---\n\n{}",
                    doc.name, text
                )));
            }
            DocumentContent::Placeholder(note) => {
                blocks.push(ContentBlock::text(format!(
                    "--- Arquivo: {} ---\n\n{}",
                    doc.name, note
                )));
            }
        }
    }

    blocks
}

/// Compose the displayed report: type header, scanned notice, report body,
/// truncation notice, in that order.
pub fn render(doc_type: DocumentType, report: &str, flags: ReportFlags) -> String {
    let mut out = format!(
        "📋 *Documento identificado como: {}*\n\n",
        doc_type.display_name()
    );
    if flags.had_binary_fallback {
        out.push_str(SCANNED_NOTICE);
    }
    out.push_str(report);
    if flags.truncated {
        out.push_str(TRUNCATED_NOTICE);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Scripted reasoning service: hands out canned replies in order and
    /// records every request it sees.
    struct ScriptedService {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedService {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReasoningService for ScriptedService {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn service_with(
        replies: Vec<Result<String, LlmError>>,
    ) -> (AnalysisService, Arc<ScriptedService>) {
        let scripted = ScriptedService::new(replies);
        let service = AnalysisService::new(scripted.clone(), Settings::default());
        (service, scripted)
    }

    fn text_block(block: &ContentBlock) -> &str {
        match block {
            ContentBlock::Text { text } => text,
            other => panic!("expected text block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_renders_classified_report() {
        let (service, scripted) = service_with(vec![
            Ok("TR".to_string()),
            Ok("Relatório detalhado.".to_string()),
        ]);

        let docs = vec![NormalizedDocument::text("tr.txt", "Termo de Referência nº 12/2024")];
        let report = service.analyze(docs).await.unwrap();

        assert_eq!(report.doc_type, DocumentType::ReferenceTerm);
        assert!(report.text.starts_with("📋 *Documento identificado como: Termo de Referência*"));
        assert!(report.text.contains("Relatório detalhado."));
        assert!(!report.text.contains("truncado"));
        assert!(!report.text.contains("digitalizado"));

        let requests = scripted.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].max_tokens, 20);
        assert_eq!(requests[0].system, prompts::CLASSIFICATION_PROMPT);
        assert_eq!(requests[1].max_tokens, 4096);
        assert_eq!(requests[1].system, prompts::TR_PROMPT);
    }

    #[tokio::test]
    async fn test_unknown_classification_flags_uncertainty() {
        let (service, scripted) = service_with(vec![
            Ok("não sei dizer".to_string()),
            Ok("análise".to_string()),
        ]);

        let docs = vec![NormalizedDocument::text("doc.txt", "conteúdo qualquer")];
        let report = service.analyze(docs).await.unwrap();

        assert_eq!(report.doc_type, DocumentType::Unknown);
        let requests = scripted.requests();
        let prefix = text_block(&requests[1].content[0]);
        assert!(prefix.contains("não foi claramente identificado"));
    }

    #[tokio::test]
    async fn test_assembly_order_for_mixed_batch() {
        // file A: text PDF, file B: scanned PDF, file C: docx text
        let (service, scripted) = service_with(vec![
            Ok("EDITAL".to_string()),
            Ok("ok".to_string()),
        ]);

        let docs = vec![
            NormalizedDocument::text("a.pdf", "texto do edital A"),
            NormalizedDocument::binary("b.pdf", "application/pdf", vec![1, 2, 3]),
            NormalizedDocument::text("c.docx", "texto do anexo C"),
        ];
        service.analyze(docs).await.unwrap();

        let requests = scripted.requests();
        let analysis = &requests[1].content;

        // prefix, A text, B document, B caption, C text
        assert_eq!(analysis.len(), 5);
        assert!(text_block(&analysis[0]).starts_with("Analise o seguinte Edital"));
        assert!(text_block(&analysis[1]).contains("--- Arquivo: a.pdf ---"));
        assert!(matches!(analysis[2], ContentBlock::Document { .. }));
        assert!(text_block(&analysis[3]).contains("b.pdf"));
        assert!(text_block(&analysis[4]).contains("--- Arquivo: c.docx ---"));

        // classification saw the binary whole as well
        let classification = &requests[0].content;
        assert!(classification
            .iter()
            .any(|b| matches!(b, ContentBlock::Document { .. })));
    }

    #[tokio::test]
    async fn test_classification_samples_text_documents() {
        let (service, scripted) = service_with(vec![
            Ok("TR".to_string()),
            Ok("ok".to_string()),
        ]);

        let long_text = "a".repeat(6_000);
        let docs = vec![NormalizedDocument::text("grande.txt", long_text)];
        service.analyze(docs).await.unwrap();

        let requests = scripted.requests();
        let sample = text_block(&requests[0].content[1]);
        // header + exactly 5,000 sampled chars
        let body = sample.split("---\n\n").nth(1).unwrap();
        assert_eq!(body.chars().count(), 5_000);
        // the full call keeps the whole text
        let full = text_block(&requests[1].content[1]);
        let full_body = full.split("---\n\n").nth(1).unwrap();
        assert_eq!(full_body.chars().count(), 6_000);
    }

    #[tokio::test]
    async fn test_truncation_boundary_and_notice() {
        let (service, scripted) = service_with(vec![
            Ok("TR".to_string()),
            Ok("ok".to_string()),
        ]);
        let docs = vec![NormalizedDocument::text("x.txt", "a".repeat(180_001))];
        let report = service.analyze(docs).await.unwrap();

        assert!(report.text.contains("truncado"));
        let requests = scripted.requests();
        let full = text_block(&requests[1].content[1]);
        let body = full.split("---\n\n").nth(1).unwrap();
        assert_eq!(body.chars().count(), 180_000);
    }

    #[tokio::test]
    async fn test_exact_limit_is_not_truncated() {
        let (service, _) = service_with(vec![
            Ok("TR".to_string()),
            Ok("ok".to_string()),
        ]);
        let docs = vec![NormalizedDocument::text("x.txt", "a".repeat(180_000))];
        let report = service.analyze(docs).await.unwrap();
        assert!(!report.text.contains("truncado"));
    }

    #[tokio::test]
    async fn test_scanned_notice_for_binary_fallback() {
        let (service, _) = service_with(vec![
            Ok("EDITAL".to_string()),
            Ok("ok".to_string()),
        ]);
        let docs = vec![NormalizedDocument::binary("scan.pdf", "application/pdf", vec![9])];
        let report = service.analyze(docs).await.unwrap();
        assert!(report.text.contains("interpretados visualmente"));
    }

    #[tokio::test]
    async fn test_all_placeholders_short_circuit_before_any_call() {
        let (service, scripted) = service_with(vec![Ok("TR".to_string())]);
        let docs = vec![
            NormalizedDocument::placeholder("a.xyz", "[Formato não suportado: xyz. Use PDF ou DOCX.]"),
            NormalizedDocument::placeholder("b.doc", "[Erro ao extrair texto deste arquivo. Formato: doc]"),
        ];

        let result = service.analyze(docs).await;
        assert!(matches!(result, Err(AnalysisError::NothingToAnalyze)));
        assert!(scripted.requests().is_empty());
    }

    #[tokio::test]
    async fn test_placeholders_ride_along_with_usable_documents() {
        let (service, scripted) = service_with(vec![
            Ok("TR".to_string()),
            Ok("ok".to_string()),
        ]);
        let docs = vec![
            NormalizedDocument::text("bom.txt", "conteúdo"),
            NormalizedDocument::placeholder("ruim.doc", "[Formato .doc antigo - converta para .docx ou .pdf para melhor resultado]"),
        ];
        service.analyze(docs).await.unwrap();

        let analysis = &scripted.requests()[1].content;
        assert!(text_block(&analysis[2]).contains("ruim.doc"));
        assert!(text_block(&analysis[2]).contains(".doc antigo"));
    }

    #[test]
    fn test_render_order_is_deterministic() {
        let flags = ReportFlags {
            truncated: true,
            had_binary_fallback: true,
        };
        let out = render(DocumentType::BiddingNotice, "corpo do relatório", flags);

        let header = out.find("Edital de Licitação").unwrap();
        let scanned = out.find("interpretados visualmente").unwrap();
        let body = out.find("corpo do relatório").unwrap();
        let truncated = out.find("truncado").unwrap();
        assert!(header < scanned && scanned < body && body < truncated);

        // pure: same inputs, same output
        assert_eq!(out, render(DocumentType::BiddingNotice, "corpo do relatório", flags));
    }

    #[test]
    fn test_assemble_omits_empty_prefix() {
        let docs = vec![NormalizedDocument::text("a.txt", "x")];
        let blocks = assemble(&docs, "");
        assert_eq!(blocks.len(), 1);
        assert!(text_block(&blocks[0]).contains("--- Arquivo: a.txt ---"));
    }
}
