// Text extractor abstraction for document processing
//
// This module defines the boundary between document text extraction
// (PDF/OCR -> raw text, performed by an external engine) and identifier
// extraction (raw text -> ExtractionRecord). Everything after this point
// works with plain text and is engine-agnostic.

use crate::errors::ExtractError;
use std::path::Path;

/// TextExtractor trait - produces raw page text for a document
///
/// This is the key abstraction boundary in predex. Extractors handle:
/// - Document format access (pre-OCR'd text files, rendered PDFs, ...)
/// - Returning the document's full text as one string
///
/// A failing extractor is isolated per document by the BatchCoordinator;
/// it never aborts the batch.
pub trait TextExtractor: Send + Sync {
    /// Extract the raw text of one document.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;

    /// Get extractor name for debugging/logging and cache attribution
    fn name(&self) -> &str;

    /// Check if the extractor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

/// Reads documents that already went through an external OCR engine and
/// were saved as plain-text sidecars (one `.txt` per submission).
pub struct PlainTextExtractor;

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::ExtractionFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        // OCR output is not reliably UTF-8; lossy conversion keeps the
        // digits and identifier letters we care about intact
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn name(&self) -> &str {
        "plain-text"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_text_files() {
        let path = std::env::temp_dir().join("predex_test_extractor_K100000.txt");
        std::fs::write(&path, "predicate K123456").unwrap();

        let extractor = PlainTextExtractor::new();
        assert!(extractor.supports_file_type(&path));
        assert_eq!(extractor.extract_text(&path).unwrap(), "predicate K123456");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_extraction_failure() {
        let extractor = PlainTextExtractor::new();
        let err = extractor
            .extract_text(Path::new("/nonexistent/K000000.txt"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailure { .. }));
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let extractor = PlainTextExtractor::new();
        assert!(!extractor.supports_file_type(Path::new("doc.pdf")));
        assert!(!extractor.supports_file_type(Path::new("no_extension")));
    }
}
