//! Content extraction from heterogeneous document formats.
//!
//! Converts raw files into normalized documents. Extraction never fails
//! outward: unreadable or unsupported input degrades to a placeholder
//! document carrying an advisory note, and the batch proceeds.

mod docx;
mod pdf;

use crate::models::{NormalizedDocument, RawFile};

/// File types accepted for analysis, matched against the extension hint.
pub const SUPPORTED_FILETYPES: &[&str] = &["pdf", "docx", "doc", "txt", "md", "csv"];

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Advisory note for legacy .doc files the docx reader cannot parse.
const LEGACY_DOC_NOTE: &str =
    "[Formato .doc antigo - converta para .docx ou .pdf para melhor resultado]";

/// Advisory note for files that parse but carry no text at all.
const EMPTY_FILE_NOTE: &str = "[Arquivo vazio ou sem texto extraível]";

/// Whether a file is in a format the pipeline understands.
pub fn is_supported(filetype: &str, mime_type: &str) -> bool {
    SUPPORTED_FILETYPES.contains(&filetype.to_lowercase().as_str())
        || mime_type.to_lowercase().starts_with("text/")
}

/// Placeholder document for a file whose bytes never arrived or whose
/// extraction failed outright.
pub fn failed_placeholder(name: &str, filetype: &str) -> NormalizedDocument {
    NormalizedDocument::placeholder(
        name,
        format!(
            "[Erro ao extrair texto deste arquivo. Formato: {}]",
            filetype
        ),
    )
}

/// Normalizes raw files into text, preserved binary, or placeholder
/// documents, dispatching on the declared type and MIME.
pub struct ContentExtractor {
    /// Minimum extracted characters before a PDF falls back to the scanned
    /// path.
    min_text_chars: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self { min_text_chars: 50 }
    }
}

impl ContentExtractor {
    pub fn new(min_text_chars: usize) -> Self {
        Self { min_text_chars }
    }

    /// Normalize a raw file. Infallible by contract: failures degrade to a
    /// placeholder document.
    pub fn extract(&self, file: RawFile) -> NormalizedDocument {
        let filetype = file.filetype.to_lowercase();
        let mime = file.mime_type.to_lowercase();

        if filetype == "pdf" || mime == "application/pdf" {
            return self.extract_pdf(file);
        }
        if filetype == "docx" || mime == DOCX_MIME {
            return extract_word(file, false);
        }
        if filetype == "doc" || mime == "application/msword" {
            // The docx reader occasionally handles mislabeled files; a real
            // legacy .doc fails and degrades to the advisory note.
            return extract_word(file, true);
        }
        if mime.starts_with("text/") || matches!(filetype.as_str(), "txt" | "md" | "csv") {
            let text = String::from_utf8_lossy(&file.bytes).into_owned();
            if text.trim().is_empty() {
                return NormalizedDocument::placeholder(file.name, EMPTY_FILE_NOTE);
            }
            return NormalizedDocument::text(file.name, text);
        }

        tracing::debug!("unsupported format: {} ({})", file.name, file.filetype);
        NormalizedDocument::placeholder(
            file.name,
            format!("[Formato não suportado: {}. Use PDF ou DOCX.]", file.filetype),
        )
    }

    /// PDF path: text layer when it is plausible, original bytes otherwise.
    fn extract_pdf(&self, file: RawFile) -> NormalizedDocument {
        match pdf::extract_text(&file.bytes) {
            Ok(text) if text.trim().chars().count() >= self.min_text_chars => {
                NormalizedDocument::text(file.name, text)
            }
            Ok(text) => {
                tracing::info!(
                    "PDF {} yielded only {} chars, keeping bytes for visual interpretation",
                    file.name,
                    text.trim().chars().count()
                );
                NormalizedDocument::binary(file.name, "application/pdf", file.bytes)
            }
            Err(err) => {
                tracing::warn!("PDF text extraction failed for {}: {}", file.name, err);
                NormalizedDocument::binary(file.name, "application/pdf", file.bytes)
            }
        }
    }
}

fn extract_word(file: RawFile, legacy: bool) -> NormalizedDocument {
    match docx::extract_text(&file.bytes) {
        Ok(text) if !text.trim().is_empty() => NormalizedDocument::text(file.name, text),
        Ok(_) => NormalizedDocument::placeholder(file.name, EMPTY_FILE_NOTE),
        Err(err) => {
            tracing::warn!("word extraction failed for {}: {}", file.name, err);
            let note = if legacy {
                LEGACY_DOC_NOTE.to_string()
            } else {
                format!(
                    "[Erro ao extrair texto deste arquivo. Formato: {}]",
                    file.filetype
                )
            };
            NormalizedDocument::placeholder(file.name, note)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentContent;

    fn raw(name: &str, mime: &str, filetype: &str, bytes: &[u8]) -> RawFile {
        RawFile {
            name: name.to_string(),
            mime_type: mime.to_string(),
            filetype: filetype.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported("pdf", "application/pdf"));
        assert!(is_supported("docx", ""));
        assert!(is_supported("doc", "application/msword"));
        assert!(is_supported("md", ""));
        assert!(is_supported("csv", ""));
        // Unknown extension but textual MIME still passes
        assert!(is_supported("log", "text/plain"));
        assert!(!is_supported("png", "image/png"));
        assert!(!is_supported("zip", "application/zip"));
    }

    #[test]
    fn test_plain_text_decodes_verbatim() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(raw("nota.txt", "text/plain", "txt", "linha 1\nlinha 2".as_bytes()));
        assert_eq!(doc.content, DocumentContent::Text("linha 1\nlinha 2".to_string()));
        assert_eq!(doc.name, "nota.txt");
    }

    #[test]
    fn test_text_mime_prefix_wins_for_unknown_extension() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(raw("saida.log", "text/x-log", "log", b"conteudo"));
        assert!(matches!(doc.content, DocumentContent::Text(_)));
    }

    #[test]
    fn test_empty_text_file_degrades_to_placeholder() {
        // Empty extraction never yields an empty text document; the batch
        // usability check relies on that.
        let extractor = ContentExtractor::default();
        for bytes in [&b""[..], b"  \n\t "] {
            let doc = extractor.extract(raw("vazio.txt", "text/plain", "txt", bytes));
            assert_eq!(doc.content, DocumentContent::Placeholder(EMPTY_FILE_NOTE.to_string()));
        }
    }

    #[test]
    fn test_unsupported_format_yields_placeholder() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(raw("foto.png", "image/png", "png", &[0x89, 0x50]));
        match doc.content {
            DocumentContent::Placeholder(note) => {
                assert!(note.contains("png"));
                assert!(note.contains("não suportado"));
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_pdf_preserves_bytes() {
        let extractor = ContentExtractor::default();
        let bytes = b"definitely not a pdf".to_vec();
        let doc = extractor.extract(raw("digitalizado.pdf", "application/pdf", "pdf", &bytes));
        match doc.content {
            DocumentContent::Binary { media_type, bytes: kept } => {
                assert_eq!(media_type, "application/pdf");
                assert_eq!(kept, bytes);
            }
            other => panic!("expected binary fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_doc_degrades_to_advisory_note() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(raw("antigo.doc", "application/msword", "doc", b"\xd0\xcf\x11\xe0"));
        match doc.content {
            DocumentContent::Placeholder(note) => assert_eq!(note, LEGACY_DOC_NOTE),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_broken_docx_yields_error_placeholder() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(raw("quebrado.docx", DOCX_MIME, "docx", b"not a zip"));
        match doc.content {
            DocumentContent::Placeholder(note) => assert!(note.contains("Erro ao extrair")),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_placeholder_names_format() {
        let doc = failed_placeholder("arquivo.pdf", "pdf");
        assert!(!doc.is_usable());
        match doc.content {
            DocumentContent::Placeholder(note) => assert!(note.contains("pdf")),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }
}
