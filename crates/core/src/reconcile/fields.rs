//! Field extraction for ledger rows
//!
//! Card transactions carry branch, department and category as custom fields
//! keyed by opaque upstream ids. The ids are resolved once per run from the
//! field names in configuration and carried in [`CustomFieldIds`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use spendledger_domain::constants::BUDGET_BRANCH_MAX_LEN;
use spendledger_domain::{CustomFieldEntry, LedgerError, ResolvedFields, Result};

/// Identifiers of the custom fields that feed ledger columns.
///
/// A `None` id means the field is not configured upstream and is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFieldIds {
    pub branch: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub memo: Option<String>,
}

impl CustomFieldIds {
    /// Build from a name → id map and the configured field names.
    pub fn from_names(
        ids_by_name: &HashMap<String, String>,
        branch: &str,
        department: &str,
        category: &str,
        memo: Option<&str>,
    ) -> Self {
        let lookup = |name: &str| ids_by_name.get(name).cloned();
        Self {
            branch: lookup(branch),
            department: lookup(department),
            category: lookup(category),
            memo: memo.and_then(lookup),
        }
    }

    /// Single pass over the entries; the first non-empty value per slot wins.
    pub fn extract(&self, entries: &[CustomFieldEntry]) -> ResolvedFields {
        let mut fields = ResolvedFields::default();

        for entry in entries {
            let Some(text) = entry.value.as_text() else {
                continue;
            };
            let id = Some(entry.field_id.as_str());

            let slot = if id == self.branch.as_deref() {
                &mut fields.branch
            } else if id == self.department.as_deref() {
                &mut fields.department
            } else if id == self.category.as_deref() {
                &mut fields.category
            } else if id == self.memo.as_deref() {
                &mut fields.memo
            } else {
                continue;
            };

            if slot.is_none() {
                *slot = Some(text.to_string());
            }
        }

        fields
    }
}

/// Per-run lookup tables shared by every record of a work set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    /// Owner reference → display name
    pub user_names: HashMap<String, String>,
    pub field_ids: CustomFieldIds,
}

/// Branch derived from an account-level budget id, when it looks like a name.
///
/// Ids containing `=` or `-`, and anything longer than a short label, are
/// opaque identifiers rather than branch names.
pub fn budget_branch_candidate(budget_id: Option<&str>) -> Option<String> {
    let raw = budget_id?.trim();
    if raw.is_empty()
        || raw.len() > BUDGET_BRANCH_MAX_LEN
        || raw.contains('=')
        || raw.contains('-')
    {
        return None;
    }
    Some(raw.to_string())
}

/// Parse an upstream date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (date taken in the timestamp's
/// own offset), `MM/DD/YYYY` and naive `YYYY-MM-DDTHH:MM:SS` values.
pub fn parse_transaction_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidInput("transaction date is missing".into()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Ok(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(timestamp.date());
        }
    }

    Err(LedgerError::InvalidInput(format!("unparseable transaction date '{trimmed}'")))
}
