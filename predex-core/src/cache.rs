use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const PREDEX_VERSION: &str = "0.1.0";
    pub const EXTRACTION_VERSION: &str = "1.0.0";
}

/// Cached extracted text for one document, keyed by the document's content
/// hash. Re-running a batch skips the expensive external extraction step
/// for every document already seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedText {
    pub text: String,
    /// Name of the extractor that produced the text
    pub extractor: String,
    pub created_at: DateTime<Utc>,
    pub cache_version: String,
}

impl CachedText {
    pub fn new(text: String, extractor: &str) -> Self {
        Self {
            text,
            extractor: extractor.to_string(),
            created_at: Utc::now(),
            cache_version: versions::PREDEX_VERSION.to_string(),
        }
    }
}
