//! Data models for the analysis pipeline.

mod document;

pub use document::{DocumentContent, DocumentType, NormalizedDocument, RawFile};
