//! Reference lookups for card records
//!
//! Both tables are fetched once per run and discarded afterwards.

use std::collections::HashMap;

use serde::Deserialize;
use spendledger_core::CustomFieldIds;
use spendledger_domain::config::CustomFieldNames;
use spendledger_domain::Result;
use tracing::{debug, warn};

use super::client::{CardClient, FetchMode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomFieldDefinition {
    id: String,
    name: String,
}

impl CardUser {
    fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

/// User id → "First Last" for every user with a name.
pub async fn user_names(client: &CardClient) -> Result<HashMap<String, String>> {
    let users: Vec<CardUser> =
        client.fetch_pages("users", &[], client.limits(FetchMode::Historical)).await?;

    let names: HashMap<String, String> = users
        .into_iter()
        .filter_map(|user| user.display_name().map(|name| (user.id, name)))
        .collect();
    debug!(users = names.len(), "card user directory loaded");
    Ok(names)
}

/// Resolve the configured custom-field names to upstream field ids.
pub async fn custom_field_ids(client: &CardClient, names: &CustomFieldNames) -> Result<CustomFieldIds> {
    let definitions: Vec<CustomFieldDefinition> =
        client.fetch_pages("custom-fields", &[], client.limits(FetchMode::Routine)).await?;

    let by_name: HashMap<String, String> = definitions
        .into_iter()
        .map(|definition| (definition.name.trim().to_string(), definition.id))
        .collect();

    let ids = CustomFieldIds::from_names(
        &by_name,
        &names.branch,
        &names.department,
        &names.category,
        names.memo.as_deref(),
    );
    for (label, id) in [("branch", &ids.branch), ("department", &ids.department), ("category", &ids.category)] {
        if id.is_none() {
            warn!(field = label, "custom field not found upstream; column will stay empty");
        }
    }
    Ok(ids)
}
