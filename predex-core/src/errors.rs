//! Error types for the extraction pipeline.
//!
//! Candidates that fail format or corpus checks are not errors — they are
//! dropped silently by the validator, which is the expected fate of most
//! OCR noise. The variants here are the conditions that change run
//! semantics.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// Per-document text extraction failed. Isolated: the document
    /// contributes an empty record and the batch continues.
    #[error("text extraction failed for {path}: {reason}")]
    ExtractionFailure { path: PathBuf, reason: String },

    /// No known identifiers loaded at all. The pipeline could technically
    /// run, but every candidate would be rejected and the output would
    /// silently mean "nothing" instead of "nothing verified" — so this is
    /// batch-fatal.
    #[error("reference corpus is empty — no identifier can be verified")]
    CorpusUnavailable,

    /// An existing output table's header cannot be parsed back into
    /// predicate/reference column counts. Fatal for incremental mode;
    /// callers may recover by rebuilding from scratch.
    #[error("cannot reconcile existing output table: {0}")]
    MergeSchemaMismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Type alias for [`Result<T, ExtractError>`].
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failure_display_names_the_document() {
        let err = ExtractError::ExtractionFailure {
            path: PathBuf::from("batch/K241234.txt"),
            reason: "engine returned no pages".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("K241234"));
        assert!(display.contains("no pages"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ExtractError = io_err.into();
        match err {
            ExtractError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn merge_mismatch_display() {
        let err = ExtractError::MergeSchemaMismatch("unexpected column 'Notes'".to_string());
        assert!(format!("{err}").contains("unexpected column"));
    }
}
