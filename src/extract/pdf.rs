//! PDF text-layer extraction, isolated from library panics.

use std::panic;

/// Extract the text layer from an in-memory PDF.
///
/// pdf-extract (and its font parsers) can panic on malformed glyph data,
/// so the call runs under `catch_unwind` and a panic reports as an error.
/// Callers treat any error here as the scanned-document case.
pub fn extract_text(bytes: &[u8]) -> Result<String, String> {
    let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err("extraction panicked (malformed font data)".to_string()),
    }
}
