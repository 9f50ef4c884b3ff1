use crate::corpus::ReferenceCorpus;
use crate::types::{Identifier, Role};

/// Labels each validated identifier as Predicate or Reference Device
/// relative to the source document.
pub struct DeviceClassifier;

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Product-code rule: an identifier is a Predicate iff its corpus
    /// product code equals the source document's own product code;
    /// everything else is a Reference Device.
    ///
    /// Promotion rule: a lone reference device with no predicates at all
    /// is re-labeled Predicate — a single cited device is very likely the
    /// actual predicate even when product-code metadata is missing or
    /// mismatched.
    pub fn classify(
        &self,
        identifiers: &[Identifier],
        doc_product_code: Option<&str>,
        corpus: &ReferenceCorpus,
    ) -> Vec<(Identifier, Role)> {
        let mut classified: Vec<(Identifier, Role)> = identifiers
            .iter()
            .map(|identifier| {
                let code = corpus.product_code(identifier.as_str());
                let role = match (code, doc_product_code) {
                    (Some(id_code), Some(doc_code)) if id_code == doc_code => Role::Predicate,
                    _ => Role::ReferenceDevice,
                };
                (identifier.clone(), role)
            })
            .collect();

        let predicates = classified
            .iter()
            .filter(|(_, role)| *role == Role::Predicate)
            .count();
        let references = classified.len() - predicates;
        if predicates == 0 && references == 1 {
            if let Some(entry) = classified.first_mut() {
                entry.1 = Role::Predicate;
            }
        }

        classified
    }
}

/// Split a classified list into (predicates, reference_devices), both in
/// classification order.
pub fn partition_roles(classified: Vec<(Identifier, Role)>) -> (Vec<Identifier>, Vec<Identifier>) {
    let mut predicates = Vec::new();
    let mut reference_devices = Vec::new();
    for (identifier, role) in classified {
        match role {
            Role::Predicate => predicates.push(identifier),
            Role::ReferenceDevice => reference_devices.push(identifier),
        }
    }
    (predicates, reference_devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::IdentifierValidator;
    use std::collections::{HashMap, HashSet};

    fn corpus(k: &[&str], codes: &[(&str, &str)]) -> ReferenceCorpus {
        ReferenceCorpus::from_parts(
            k.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
            HashSet::new(),
            codes
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn validated(corpus: &ReferenceCorpus, ids: &[&str]) -> Vec<Identifier> {
        let validator = IdentifierValidator::new().unwrap();
        ids.iter()
            .map(|id| validator.validate(id, corpus).expect("test id must validate"))
            .collect()
    }

    #[test]
    fn matching_product_code_is_predicate() {
        let corpus = corpus(
            &["K100001", "K999999"],
            &[("K100001", "ABC"), ("K999999", "XYZ")],
        );
        let ids = validated(&corpus, &["K100001", "K999999"]);

        let classified = DeviceClassifier::new().classify(&ids, Some("ABC"), &corpus);
        let (predicates, references) = partition_roles(classified);

        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].as_str(), "K100001");
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].as_str(), "K999999");
    }

    #[test]
    fn lone_reference_is_promoted_to_predicate() {
        let corpus = corpus(&["K555555"], &[("K555555", "XYZ")]);
        let ids = validated(&corpus, &["K555555"]);

        let classified = DeviceClassifier::new().classify(&ids, Some("ABC"), &corpus);
        let (predicates, references) = partition_roles(classified);

        assert_eq!(predicates.len(), 1);
        assert!(references.is_empty());
    }

    #[test]
    fn two_references_are_not_promoted() {
        let corpus = corpus(
            &["K555555", "K666666"],
            &[("K555555", "XYZ"), ("K666666", "QRS")],
        );
        let ids = validated(&corpus, &["K555555", "K666666"]);

        let classified = DeviceClassifier::new().classify(&ids, Some("ABC"), &corpus);
        let (predicates, references) = partition_roles(classified);

        assert!(predicates.is_empty());
        assert_eq!(references.len(), 2);
    }

    #[test]
    fn missing_document_product_code_means_no_direct_predicates() {
        let corpus = corpus(
            &["K555555", "K666666"],
            &[("K555555", "ABC"), ("K666666", "ABC")],
        );
        let ids = validated(&corpus, &["K555555", "K666666"]);

        let classified = DeviceClassifier::new().classify(&ids, None, &corpus);
        let (predicates, references) = partition_roles(classified);

        assert!(predicates.is_empty());
        assert_eq!(references.len(), 2);
    }
}
