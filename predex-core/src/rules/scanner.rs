//! Regex-based candidate discovery over raw document text.
//!
//! One OCR-tolerant pattern recognizes K/N/P-shaped tokens, allowing the
//! same misread character classes the corrector fixes plus the mangled
//! leading-K ligatures; a separate strict pattern recognizes De Novo
//! numbers. Tokens carrying a `/S###` supplement suffix are additionally
//! recorded verbatim, independent of whether the base token validates.

use crate::types::{Candidate, Identifier};
use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;

/// K/N/P-shaped tokens with OCR damage: misread digit classes after the
/// prefix letter, mangled `K(` ligatures in place of the letter, and an
/// optional supplement suffix.
const KNP_PATTERN: &str =
    r"(?i)(?:\|<\.|\|\(|1\(|l\(|1<|[KNP])[0-9OISBGZAQ]{4,7}(?:/S\d{3})?";

/// De Novo numbers come out of OCR clean often enough that a strict match
/// is the better recall/precision trade.
const DEN_PATTERN: &str = r"(?i)DEN\d{6,7}";

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub candidates: Vec<Candidate>,
    /// `/S###`-suffixed tokens, verbatim as matched
    pub supplements: Vec<String>,
}

pub struct CandidateScanner {
    knp_re: Regex,
    den_re: Regex,
}

impl CandidateScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            knp_re: Regex::new(KNP_PATTERN)?,
            den_re: Regex::new(DEN_PATTERN)?,
        })
    }

    /// Discover identifier-shaped tokens. Candidates carry their byte
    /// offsets in `text`; supplement tokens are recorded verbatim.
    pub fn scan(&self, text: &str) -> ScanOutput {
        let mut output = ScanOutput::default();

        for m in self.knp_re.find_iter(text) {
            let matched = m.as_str();
            // Track the supplement form before stripping it off the base
            // candidate — supplement bookkeeping is independent of base
            // validity
            let base = match matched.split_once('/') {
                Some((base, _)) => {
                    output.supplements.push(matched.to_string());
                    base
                }
                None => matched,
            };
            output.candidates.push(Candidate {
                raw: base.to_string(),
                start: m.start(),
                end: m.end(),
            });
        }

        for m in self.den_re.find_iter(text) {
            output.candidates.push(Candidate {
                raw: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            });
        }

        // Two patterns, one candidate stream: document order, so
        // first-occurrence dedup downstream means what it says
        output.candidates.sort_by_key(|c| c.start);

        output
    }
}

/// Deduplicate validated identifiers preserving first-occurrence order, and
/// drop the source document's own id — a submission must not list itself as
/// its own predicate or reference.
pub fn dedup_identifiers(identifiers: Vec<Identifier>, own_device_id: &str) -> Vec<Identifier> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped = Vec::new();
    for identifier in identifiers {
        if identifier.as_str() == own_device_id {
            continue;
        }
        if seen.insert(identifier.as_str().to_string()) {
            deduped.push(identifier);
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ReferenceCorpus;
    use crate::rules::{ocr, IdentifierValidator};
    use std::collections::{HashMap, HashSet};

    #[test]
    fn finds_clean_and_damaged_tokens() {
        let scanner = CandidateScanner::new().unwrap();
        let output = scanner.scan("predicate K123456 and the mangled |(12345G device");

        let raws: Vec<&str> = output.candidates.iter().map(|c| c.raw.as_str()).collect();
        assert_eq!(raws, vec!["K123456", "|(12345G"]);
        assert_eq!(output.candidates[0].start, 10);
    }

    #[test]
    fn finds_den_numbers_case_insensitively() {
        let scanner = CandidateScanner::new().unwrap();
        let output = scanner.scan("granted under den200012.");
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].raw, "den200012");
    }

    #[test]
    fn supplement_suffix_is_tracked_verbatim_and_stripped_from_candidate() {
        let scanner = CandidateScanner::new().unwrap();
        let output = scanner.scan("amended by P170019/S003 last year");

        assert_eq!(output.supplements, vec!["P170019/S003".to_string()]);
        assert_eq!(output.candidates[0].raw, "P170019");
    }

    #[test]
    fn supplement_is_tracked_even_when_base_is_unknown() {
        // The base won't survive corpus validation, but supplement
        // bookkeeping happens at scan time
        let scanner = CandidateScanner::new().unwrap();
        let output = scanner.scan("see K999999/S001");
        assert_eq!(output.supplements, vec!["K999999/S001".to_string()]);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order_and_drops_self() {
        let corpus = ReferenceCorpus::from_parts(
            ["K111111", "K222222", "K333333"]
                .iter()
                .map(|s| s.to_string())
                .collect::<HashSet<_>>(),
            HashSet::new(),
            HashMap::new(),
        );
        let scanner = CandidateScanner::new().unwrap();
        let validator = IdentifierValidator::new().unwrap();

        let text = "K222222 then K111111 then K222222 again, from K333333";
        let validated: Vec<_> = scanner
            .scan(text)
            .candidates
            .into_iter()
            .filter_map(|c| validator.validate(&ocr::correct(&c.raw), &corpus))
            .collect();

        let deduped = dedup_identifiers(validated, "K333333");
        let ids: Vec<&str> = deduped.iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["K222222", "K111111"]);
    }
}
