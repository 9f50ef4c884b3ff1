//! Reference corpus of known identifiers.
//!
//! Built once per run from the FDA premarket release files, then shared
//! read-only (`Arc<ReferenceCorpus>`) by every worker. The corpus is the
//! second stage of the false-positive defense: the corrector proposes
//! aggressively, and only identifiers present here survive validation.

use crate::types::ProductCode;
use anyhow::{anyhow, Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Immutable set of known identifiers plus the identifier → product-code
/// mapping. Never mutated after construction.
#[derive(Debug, Default, Clone)]
pub struct ReferenceCorpus {
    known_k_numbers: HashSet<String>,
    /// Covers both N- and P-numbers — the PMA listing carries both formats.
    known_pma_numbers: HashSet<String>,
    product_codes: HashMap<String, ProductCode>,
}

impl ReferenceCorpus {
    /// Build from pre-parsed parts. Callers that load reference data some
    /// other way (tests, alternate mirrors) feed it in here.
    pub fn from_parts(
        known_k_numbers: HashSet<String>,
        known_pma_numbers: HashSet<String>,
        product_codes: HashMap<String, ProductCode>,
    ) -> Self {
        Self {
            known_k_numbers,
            known_pma_numbers,
            product_codes,
        }
    }

    /// Build from a directory of extracted FDA release files: any number of
    /// 510(k) listing files (`pmn*.txt`) and the PMA listing (`pma.txt`).
    /// Files are pipe-delimited with a header row naming the columns.
    pub fn from_release_files(dir: &Path) -> Result<Self> {
        let mut corpus = Self::default();
        let mut files_seen = 0usize;

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read reference directory: {}", dir.display()))?
        {
            let path = entry?.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_ascii_lowercase(),
                None => continue,
            };
            if name.starts_with("pmn") && name.ends_with(".txt") {
                corpus.load_premarket_file(&path, "KNUMBER")?;
                files_seen += 1;
            } else if name.starts_with("pma") && name.ends_with(".txt") {
                corpus.load_premarket_file(&path, "PMANUMBER")?;
                files_seen += 1;
            }
        }

        if files_seen == 0 {
            return Err(anyhow!(
                "No reference files found in {} (expected pmn*.txt / pma*.txt)",
                dir.display()
            ));
        }

        println!(
            "📚 Reference corpus loaded: {} K-numbers, {} PMA numbers, {} product codes",
            corpus.known_k_numbers.len(),
            corpus.known_pma_numbers.len(),
            corpus.product_codes.len()
        );
        Ok(corpus)
    }

    /// Parse one pipe-delimited release file. `id_column` is the header
    /// name of the identifier column ("KNUMBER" or "PMANUMBER").
    fn load_premarket_file(&mut self, path: &Path, id_column: &str) -> Result<()> {
        // Release files are CP-1252, not UTF-8 — applicant names carry
        // accented characters. Lossy conversion is fine: the columns we
        // read are plain ASCII.
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read reference file: {}", path.display()))?;
        let contents = String::from_utf8_lossy(&bytes);

        let mut lines = contents.lines();
        let header = lines
            .next()
            .ok_or_else(|| anyhow!("Reference file is empty: {}", path.display()))?;
        let columns: Vec<&str> = header.split('|').map(str::trim).collect();

        let id_idx = columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(id_column))
            .ok_or_else(|| {
                anyhow!(
                    "Reference file {} has no {} column",
                    path.display(),
                    id_column
                )
            })?;
        let code_idx = columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case("PRODUCTCODE"));

        let mut parsed = 0usize;
        for line in lines {
            let fields: Vec<&str> = line.split('|').collect();
            let id = match fields.get(id_idx) {
                Some(f) if !f.trim().is_empty() => f.trim().to_uppercase(),
                _ => continue, // short or blank row — upstream data is messy
            };

            if id.starts_with('K') {
                self.known_k_numbers.insert(id.clone());
            } else {
                // PMA listing mixes P- and legacy N-numbers in one column
                self.known_pma_numbers.insert(id.clone());
            }

            if let Some(code_idx) = code_idx {
                if let Some(code) = fields.get(code_idx) {
                    let code = code.trim().to_uppercase();
                    if !code.is_empty() {
                        // PMA supplements repeat the base number — first
                        // row wins, matching the original listing order
                        self.product_codes.entry(id).or_insert(code);
                    }
                }
            }
            parsed += 1;
        }

        println!(
            "   📄 {}: {} rows parsed",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
            parsed
        );
        Ok(())
    }

    pub fn contains_k_number(&self, id: &str) -> bool {
        self.known_k_numbers.contains(id)
    }

    pub fn contains_pma_number(&self, id: &str) -> bool {
        self.known_pma_numbers.contains(id)
    }

    pub fn product_code(&self, device_id: &str) -> Option<&str> {
        self.product_codes.get(device_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.known_k_numbers.is_empty() && self.known_pma_numbers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.known_k_numbers.len() + self.known_pma_numbers.len()
    }

    /// Surface an empty corpus loudly before the batch aborts — an empty
    /// corpus flips output semantics from "verified identifiers" to "no
    /// identifiers", which must never happen silently.
    pub fn ensure_available(&self) -> crate::errors::Result<()> {
        if self.is_empty() {
            eprintln!("⚠️  Reference corpus is EMPTY — every candidate identifier would be rejected.");
            eprintln!("    Check that the FDA release files were downloaded and parsed.");
            return Err(crate::errors::ExtractError::CorpusUnavailable);
        }
        Ok(())
    }
}
