use serde::{Deserialize, Serialize};

/// FDA product classification code (three letters, e.g. "DQY")
pub type ProductCode = String;

// ===== IDENTIFIER TYPES =====
// Identifiers are the unit of value flowing through the pipeline. They are
// only ever constructed by the validator, so a non-DEN Identifier that
// reaches an ExtractionRecord has been verified against the reference
// corpus. DEN numbers are format-valid but unverified — no public corpus
// of De Novo classifications exists.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// 510(k) clearance, `K` + 6 digits
    KNumber,
    /// Legacy PMA approval, `N` + 4-5 digits
    NNumber,
    /// PMA approval, `P` + 6 digits
    PNumber,
    /// De Novo classification, `DEN` + 6-7 digits
    DenNumber,
}

/// A validated regulatory identifier in canonical uppercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    kind: IdentifierKind,
    value: String,
}

impl Identifier {
    /// Crate-private: the validator is the only construction path.
    pub(crate) fn new(kind: IdentifierKind, value: String) -> Self {
        Self { kind, value }
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Classification of an identifier relative to the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Shares the source document's product code (or won promotion)
    Predicate,
    /// Cited for comparison or context
    ReferenceDevice,
}

// ===== SCANNER TYPES =====

/// A raw identifier-shaped substring found by the scanner, with its byte
/// offset range in the source text. Ephemeral — consumed by correction and
/// validation, discarded if invalid.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Matched text with any `/S###` supplement suffix already stripped
    pub raw: String,
    pub start: usize,
    pub end: usize,
}

/// A text range believed to contain substantial-equivalence discussion.
/// Windows may overlap; no merging is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWindow {
    pub start: usize,
    pub end: usize,
}

impl SeWindow {
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

// ===== EXTRACTION OUTPUT =====

/// Per-document extraction result. Created once by a worker, never mutated
/// afterwards, owned by the BatchCoordinator once returned.
///
/// `predicates` and `reference_devices` are first-occurrence-ordered and
/// deduplicated; `supplement_matches` holds `/S###`-suffixed tokens
/// verbatim as they appeared in the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub device_id: String,
    pub product_code: Option<ProductCode>,
    pub predicates: Vec<Identifier>,
    pub reference_devices: Vec<Identifier>,
    pub supplement_matches: Vec<String>,
}

impl ExtractionRecord {
    /// The record a failed document contributes — identity only, no
    /// identifiers. Keeps the output table aligned with the input list.
    pub fn empty(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            product_code: None,
            predicates: Vec::new(),
            reference_devices: Vec::new(),
            supplement_matches: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
            && self.reference_devices.is_empty()
            && self.supplement_matches.is_empty()
    }
}

/// Derive the device id a document claims to be, from its file stem
/// (`K241234.txt` → `K241234`). Uppercased so it compares against
/// canonical identifiers.
pub fn device_id_from_path(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .trim()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn se_window_contains_is_half_open() {
        let w = SeWindow { start: 10, end: 20 };
        assert!(!w.contains(9));
        assert!(w.contains(10));
        assert!(w.contains(19));
        assert!(!w.contains(20));
    }

    #[test]
    fn device_id_uses_uppercased_file_stem() {
        assert_eq!(device_id_from_path(Path::new("docs/k241234.txt")), "K241234");
        assert_eq!(device_id_from_path(Path::new("P170019.txt")), "P170019");
    }

    #[test]
    fn empty_record_has_no_identifiers() {
        let record = ExtractionRecord::empty("K100000");
        assert_eq!(record.device_id, "K100000");
        assert!(record.is_empty());
    }
}
