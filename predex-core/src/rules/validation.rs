//! Format and corpus validation of corrected candidates.
//!
//! The second half of the two-stage defense: OCR correction proposes
//! aggressively, and only candidates that both match an identifier format
//! and exist in the reference corpus survive. Failures are silent and
//! frequent — they are OCR noise, not errors.

use crate::corpus::ReferenceCorpus;
use crate::types::{Identifier, IdentifierKind};
use anyhow::Result;
use regex::Regex;

pub struct IdentifierValidator {
    k_format: Regex,
    n_format: Regex,
    p_format: Regex,
    den_format: Regex,
}

impl IdentifierValidator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            k_format: Regex::new(r"^K\d{6}")?,
            n_format: Regex::new(r"^N\d{4,5}")?,
            p_format: Regex::new(r"^P\d{6}")?,
            // De Novo numbers are anchored both ends — there is no corpus
            // to backstop a sloppy match
            den_format: Regex::new(r"^DEN\d{6,7}$")?,
        })
    }

    /// Decide whether a corrected candidate is a real identifier, and of
    /// which kind. `None` means silently discarded.
    ///
    /// K/N/P candidates must be present in the corpus; DEN numbers pass on
    /// format alone because no De Novo reference listing exists.
    pub fn validate(&self, corrected: &str, corpus: &ReferenceCorpus) -> Option<Identifier> {
        if self.k_format.is_match(corrected)
            && corrected.len() <= 7
            && corpus.contains_k_number(corrected)
        {
            return Some(Identifier::new(IdentifierKind::KNumber, corrected.to_string()));
        }
        if self.n_format.is_match(corrected)
            && corrected.len() <= 6
            && corpus.contains_pma_number(corrected)
        {
            return Some(Identifier::new(IdentifierKind::NNumber, corrected.to_string()));
        }
        if self.p_format.is_match(corrected)
            && corrected.len() <= 7
            && corpus.contains_pma_number(corrected)
        {
            return Some(Identifier::new(IdentifierKind::PNumber, corrected.to_string()));
        }
        if self.den_format.is_match(corrected) {
            return Some(Identifier::new(
                IdentifierKind::DenNumber,
                corrected.to_string(),
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ocr;
    use std::collections::{HashMap, HashSet};

    fn corpus(k: &[&str], pma: &[&str]) -> ReferenceCorpus {
        ReferenceCorpus::from_parts(
            k.iter().map(|s| s.to_string()).collect(),
            pma.iter().map(|s| s.to_string()).collect(),
            HashMap::new(),
        )
    }

    #[test]
    fn corrected_candidate_validates_against_corpus() {
        let validator = IdentifierValidator::new().unwrap();
        let corpus = corpus(&["K123456"], &[]);

        let corrected = ocr::correct("K12345G");
        assert_eq!(corrected, "K123456");
        let id = validator.validate(&corrected, &corpus).unwrap();
        assert_eq!(id.kind(), IdentifierKind::KNumber);
        assert_eq!(id.as_str(), "K123456");
    }

    #[test]
    fn empty_corpus_rejects_everything() {
        let validator = IdentifierValidator::new().unwrap();
        let empty = corpus(&[], &[]);

        for candidate in ["K123456", "N12345", "P170019"] {
            assert!(validator.validate(candidate, &empty).is_none());
        }
    }

    #[test]
    fn unknown_identifiers_are_discarded_despite_valid_format() {
        let validator = IdentifierValidator::new().unwrap();
        let corpus = corpus(&["K123456"], &["P170019"]);

        assert!(validator.validate("K999999", &corpus).is_none());
        assert!(validator.validate("P999999", &corpus).is_none());
    }

    #[test]
    fn pma_rules_accept_both_legacy_and_current_formats() {
        let validator = IdentifierValidator::new().unwrap();
        let corpus = corpus(&[], &["N12345", "N1234", "P170019"]);

        assert_eq!(
            validator.validate("N12345", &corpus).unwrap().kind(),
            IdentifierKind::NNumber
        );
        assert_eq!(
            validator.validate("N1234", &corpus).unwrap().kind(),
            IdentifierKind::NNumber
        );
        assert_eq!(
            validator.validate("P170019", &corpus).unwrap().kind(),
            IdentifierKind::PNumber
        );
    }

    #[test]
    fn length_caps_reject_overlong_candidates() {
        let validator = IdentifierValidator::new().unwrap();
        // Corpus membership alone is not enough — the shipped rules also
        // cap candidate length
        let corpus = corpus(&["K1234567"], &["N123456"]);

        assert!(validator.validate("K1234567", &corpus).is_none());
        assert!(validator.validate("N123456", &corpus).is_none());
    }

    #[test]
    fn den_numbers_validate_on_format_alone() {
        let validator = IdentifierValidator::new().unwrap();
        let empty = corpus(&[], &[]);

        let id = validator.validate("DEN200012", &empty).unwrap();
        assert_eq!(id.kind(), IdentifierKind::DenNumber);

        assert!(validator.validate("DEN12345", &empty).is_none());
        assert!(validator.validate("DEN12345678", &empty).is_none());
        assert!(validator.validate("DEN200012X", &empty).is_none());
    }
}
