//! Vendor display names for bill headers
//!
//! Bill headers only carry the vendor's internal id. Names are fetched on
//! first use and cached for the rest of the run, including the fallback for
//! vendors that could not be read.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use super::client::ErpClient;

pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// Per-run vendor id → display name cache.
#[derive(Debug, Default)]
pub struct VendorNames {
    names: HashMap<String, String>,
}

impl VendorNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name for `vendor_id`, fetching it on a cache miss.
    ///
    /// Never fails: a missing id or a failed lookup yields [`UNKNOWN_VENDOR`].
    pub async fn resolve(&mut self, client: &ErpClient, vendor_id: Option<&str>) -> String {
        let Some(vendor_id) = vendor_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return UNKNOWN_VENDOR.to_string();
        };
        if let Some(name) = self.names.get(vendor_id) {
            return name.clone();
        }

        let name = match client.record::<Vendor>(&format!("vendor/{vendor_id}")).await {
            Ok(vendor) => vendor.display_name().unwrap_or_else(|| UNKNOWN_VENDOR.to_string()),
            Err(err) => {
                warn!(vendor_id, error = %err, "vendor lookup failed");
                UNKNOWN_VENDOR.to_string()
            }
        };
        debug!(vendor_id, name = %name, "vendor name cached");
        self.names.insert(vendor_id.to_string(), name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vendor {
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    entity_id: Option<String>,
}

impl Vendor {
    fn display_name(self) -> Option<String> {
        self.company_name
            .filter(|n| !n.trim().is_empty())
            .or(self.entity_id.filter(|n| !n.trim().is_empty()))
    }
}
