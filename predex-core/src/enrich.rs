//! Enrichment boundary: device metadata lookup for validated identifiers.
//!
//! The core never touches the network. Implementations live with the
//! orchestrator (the CLI ships an openFDA client) and are invoked only
//! after a whole batch completes.

use crate::types::Identifier;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata a remote regulatory API can attach to an identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub device_name: Option<String>,
    pub applicant: Option<String>,
    pub decision_date: Option<String>,
    pub product_code: Option<String>,
}

/// Look up metadata for a set of identifiers. Missing identifiers are
/// simply absent from the map — enrichment is best-effort.
pub trait DeviceEnricher {
    fn enrich(&self, identifiers: &[Identifier]) -> Result<HashMap<Identifier, DeviceMetadata>>;
}
