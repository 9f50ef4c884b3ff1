//! openFDA enrichment client.
//!
//! Looks up device name, applicant, and decision date for validated
//! identifiers via the public openFDA device endpoints. Invoked strictly
//! after a batch completes; requests are spaced out with a fixed delay so
//! an unkeyed client stays under the published rate limits.

use anyhow::{Context, Result};
use predex_core::{DeviceEnricher, DeviceMetadata, Identifier, IdentifierKind};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.fda.gov";

/// Delay between consecutive lookups
const REQUEST_SPACING: Duration = Duration::from_millis(250);

pub struct OpenFdaClient {
    base_url: String,
}

impl OpenFdaClient {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (test servers, mirrors)
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint for one identifier. De Novo numbers have no openFDA
    /// endpoint and yield `None`.
    fn lookup_url(&self, identifier: &Identifier) -> Option<String> {
        match identifier.kind() {
            IdentifierKind::KNumber => Some(format!(
                "{}/device/510k.json?search=k_number:{}&limit=1",
                self.base_url,
                identifier.as_str()
            )),
            IdentifierKind::PNumber | IdentifierKind::NNumber => Some(format!(
                "{}/device/pma.json?search=pma_number:{}&limit=1",
                self.base_url,
                identifier.as_str()
            )),
            IdentifierKind::DenNumber => None,
        }
    }

    fn lookup_one(&self, identifier: &Identifier) -> Result<Option<DeviceMetadata>> {
        let url = match self.lookup_url(identifier) {
            Some(url) => url,
            None => return Ok(None),
        };

        let body: Value = ureq::get(&url)
            .call()
            .with_context(|| format!("openFDA lookup failed for {identifier}"))?
            .into_json()
            .with_context(|| format!("openFDA returned invalid JSON for {identifier}"))?;

        let result = match body["results"].get(0) {
            Some(result) => result,
            None => return Ok(None),
        };

        let field = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .find_map(|name| result[name].as_str())
                .map(str::to_string)
        };

        Ok(Some(DeviceMetadata {
            // 510(k) records carry device_name, PMA records trade_name
            device_name: field(&["device_name", "trade_name"]),
            applicant: field(&["applicant"]),
            decision_date: field(&["decision_date"]),
            product_code: field(&["product_code"]),
        }))
    }
}

impl Default for OpenFdaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceEnricher for OpenFdaClient {
    /// Best-effort enrichment: identifiers whose lookup fails or returns
    /// nothing are absent from the map, and the failure is reported
    /// without aborting the rest.
    fn enrich(&self, identifiers: &[Identifier]) -> Result<HashMap<Identifier, DeviceMetadata>> {
        let mut enriched = HashMap::new();

        for (index, identifier) in identifiers.iter().enumerate() {
            if index > 0 {
                std::thread::sleep(REQUEST_SPACING);
            }
            match self.lookup_one(identifier) {
                Ok(Some(metadata)) => {
                    enriched.insert(identifier.clone(), metadata);
                }
                Ok(None) => {}
                Err(e) => eprintln!("⚠️  {e:#}"),
            }
        }

        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predex_core::{IdentifierValidator, ReferenceCorpus};
    use std::collections::{HashMap, HashSet};

    fn identifier(id: &str) -> Identifier {
        let corpus = ReferenceCorpus::from_parts(
            HashSet::from([id.to_string()]),
            HashSet::from([id.to_string()]),
            HashMap::new(),
        );
        IdentifierValidator::new()
            .unwrap()
            .validate(id, &corpus)
            .unwrap()
    }

    #[test]
    fn test_510k_lookup_url_format() {
        let client = OpenFdaClient::new();
        let url = client.lookup_url(&identifier("K123456")).unwrap();
        assert!(url.contains("api.fda.gov"));
        assert!(url.contains("510k.json"));
        assert!(url.contains("K123456"));
    }

    #[test]
    fn test_pma_lookup_url_format() {
        let client = OpenFdaClient::with_base_url("http://localhost:9999/");
        let url = client.lookup_url(&identifier("P170019")).unwrap();
        assert!(url.starts_with("http://localhost:9999/device/pma.json"));
    }

    #[test]
    fn test_den_numbers_have_no_endpoint() {
        let client = OpenFdaClient::new();
        assert!(client.lookup_url(&identifier("DEN200012")).is_none());
    }
}
