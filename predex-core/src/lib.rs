// Predex Core Library
//
// Provides predicate-device identifier extraction from OCR-scanned FDA
// submission text: OCR-tolerant scanning, correction-then-validation
// against the premarket reference corpus, predicate classification, and
// incremental tabular output.

pub mod batch;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod enrich;
pub mod errors;
pub mod extractors;
pub mod processor;
pub mod rules;
pub mod storage;
pub mod table;
pub mod types;

// Re-export main types and functions for easy use
pub use batch::{BatchCoordinator, BatchOutcome, DocumentFailure};
pub use classifier::DeviceClassifier;
pub use config::ExtractionConfig;
pub use corpus::ReferenceCorpus;
pub use enrich::{DeviceEnricher, DeviceMetadata};
pub use errors::ExtractError;
pub use extractors::{PlainTextExtractor, TextExtractor};
pub use processor::DocumentProcessor;
pub use rules::{CandidateScanner, IdentifierValidator, RelevanceScorer, SectionDetector};
pub use storage::{FileStorage, NoOpStorage, TextStorage};
pub use table::{OutputTable, SupplementTable};
pub use types::*;
