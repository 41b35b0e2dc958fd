//! Branch-name normalization
//!
//! Upstream systems spell the same branch several ways. The table is
//! deployment configuration ([`BranchNormalization`]) rather than a constant so
//! it can be varied and tested.

use std::collections::BTreeMap;

use spendledger_domain::config::{BranchNormalization, PrefixRewrite};

/// Maps upstream branch spellings to canonical labels.
#[derive(Debug, Clone, Default)]
pub struct BranchNormalizer {
    aliases: BTreeMap<String, String>,
    prefix_rewrites: Vec<PrefixRewrite>,
}

impl BranchNormalizer {
    pub fn new(table: BranchNormalization) -> Self {
        Self { aliases: table.aliases, prefix_rewrites: table.prefix_rewrites }
    }

    /// Canonical label for `raw`.
    ///
    /// Exact aliases win; otherwise the first matching prefix rewrite applies;
    /// anything else passes through trimmed.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();

        if let Some(canonical) = self.aliases.get(trimmed) {
            return canonical.clone();
        }

        for rewrite in &self.prefix_rewrites {
            if let Some(rest) = trimmed.strip_prefix(rewrite.from.as_str()) {
                return format!("{}{}", rewrite.to, rest);
            }
        }

        trimmed.to_string()
    }
}

impl From<BranchNormalization> for BranchNormalizer {
    fn from(table: BranchNormalization) -> Self {
        Self::new(table)
    }
}
