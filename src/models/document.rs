//! Document models for the intake-and-analysis pipeline.
//!
//! Everything here is request-scoped: built when files arrive, dropped once
//! the reply is dispatched. Nothing is persisted.

use serde::{Deserialize, Serialize};

/// A file as received from the transport, before extraction.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Display name (original filename).
    pub name: String,
    /// MIME type reported by the transport.
    pub mime_type: String,
    /// Extension-derived type hint (e.g. "pdf", "docx").
    pub filetype: String,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Normalized content of a single document after extraction.
///
/// Extraction always yields exactly one of these; there is no "empty"
/// outcome and no error escapes the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    /// Machine-readable text extracted from the file.
    Text(String),
    /// Original bytes preserved for visual interpretation (scanned PDFs).
    Binary { media_type: String, bytes: Vec<u8> },
    /// Extraction degraded; carries an advisory note instead of content.
    Placeholder(String),
}

/// A document normalized for assembly. Batch order is file arrival order
/// and is preserved through assembly, since it affects how the model
/// resolves references across files.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub name: String,
    pub content: DocumentContent,
}

impl NormalizedDocument {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: DocumentContent::Text(text.into()),
        }
    }

    pub fn binary(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: DocumentContent::Binary {
                media_type: media_type.into(),
                bytes,
            },
        }
    }

    pub fn placeholder(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: DocumentContent::Placeholder(note.into()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.content, DocumentContent::Binary { .. })
    }

    /// Whether extraction produced real content rather than an advisory note.
    pub fn is_usable(&self) -> bool {
        !matches!(self.content, DocumentContent::Placeholder(_))
    }
}

/// Classification assigned to a document batch. Produced once per batch,
/// never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ReferenceTerm,
    BiddingNotice,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReferenceTerm => "reference_term",
            Self::BiddingNotice => "bidding_notice",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label used in the rendered report.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ReferenceTerm => "Termo de Referência",
            Self::BiddingNotice => "Edital de Licitação",
            Self::Unknown => "Documento",
        }
    }

    /// Map a raw classification reply onto a label.
    ///
    /// "EDITAL" is checked before "TR": the shorter token occurs inside
    /// unrelated Portuguese words, so the more specific one must win.
    /// An ambiguous reply is a valid `Unknown`, never an error.
    pub fn from_reply(reply: &str) -> Self {
        let upper = reply.trim().to_uppercase();
        if upper.contains("EDITAL") {
            Self::BiddingNotice
        } else if upper.contains("TR") {
            Self::ReferenceTerm
        } else {
            Self::Unknown
        }
    }
}
