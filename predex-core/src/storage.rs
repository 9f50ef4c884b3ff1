use crate::cache::CachedText;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Storage abstraction for the extracted-text cache. Shared read-only by
/// all workers once a batch starts; entries are keyed by content hash so
/// concurrent writes for distinct documents never collide.
pub trait TextStorage: Send + Sync {
    fn get_text(&self, doc_hash: &str) -> Result<Option<CachedText>>;
    fn store_text(&self, doc_hash: &str, cached: &CachedText) -> Result<()>;
}

/// File-based storage implementation using a local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        // Ensure cache directory exists
        fs::create_dir_all(cache_dir)?;
        fs::create_dir_all(format!("{cache_dir}/text"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn text_path(&self, hash: &str) -> String {
        format!("{}/text/{}.json", self.cache_dir, hash)
    }
}

impl TextStorage for FileStorage {
    fn get_text(&self, doc_hash: &str) -> Result<Option<CachedText>> {
        let path = self.text_path(doc_hash);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let cached: CachedText = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached text: {}", e))?;
            Ok(Some(cached))
        } else {
            Ok(None)
        }
    }

    fn store_text(&self, doc_hash: &str, cached: &CachedText) -> Result<()> {
        let path = self.text_path(doc_hash);
        let json_str = serde_json::to_string(cached)
            .map_err(|e| anyhow!("Failed to serialize cached text: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// No-op storage implementation that disables text caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl TextStorage for NoOpStorage {
    fn get_text(&self, _doc_hash: &str) -> Result<Option<CachedText>> {
        Ok(None) // Always cache miss
    }

    fn store_text(&self, _doc_hash: &str, _cached: &CachedText) -> Result<()> {
        Ok(()) // No-op
    }
}

/// Calculate a fast content hash using start + end chunks — scanned
/// submissions run to hundreds of pages, hashing the whole file per run
/// is wasted work.
pub fn calculate_doc_hash(doc_bytes: &[u8]) -> String {
    let chunk_size = 1024; // 1KB from start and end
    let mut hasher = Sha256::new();

    // Hash file size first (for quick differentiation)
    hasher.update(doc_bytes.len().to_le_bytes());

    // Hash first chunk
    let start_end = std::cmp::min(chunk_size, doc_bytes.len());
    hasher.update(&doc_bytes[0..start_end]);

    // Hash last chunk (if file is large enough)
    if doc_bytes.len() > chunk_size {
        let end_start = doc_bytes.len() - chunk_size;
        hasher.update(&doc_bytes[end_start..]);
    }

    format!("{:x}", hasher.finalize())
}
