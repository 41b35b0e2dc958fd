//! Flag preservation
//!
//! A stored flag is a human decision and always wins. Reconciliation may only
//! suggest [`FlagCategory::NeedsReview`] for rows nobody has triaged yet.

use spendledger_domain::constants::AUTO_FLAG_KEYWORD;
use spendledger_domain::FlagCategory;

/// Flag chosen for a row during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagDecision {
    /// A stored flag was kept unchanged.
    Preserved(FlagCategory),
    /// No stored flag; the category matched the auto-flag keyword.
    AutoFlagged(FlagCategory),
    Unflagged,
}

impl FlagDecision {
    pub fn flag(&self) -> Option<FlagCategory> {
        match self {
            Self::Preserved(flag) | Self::AutoFlagged(flag) => Some(*flag),
            Self::Unflagged => None,
        }
    }

    pub fn is_preserved(&self) -> bool {
        matches!(self, Self::Preserved(_))
    }

    /// Flag to send with the upsert.
    ///
    /// A preserved flag is sent as `None` so the store keeps whatever is stored
    /// at write time, including a reviewer edit made after the lookup.
    pub fn write_value(&self) -> Option<FlagCategory> {
        match self {
            Self::Preserved(_) => None,
            other => other.flag(),
        }
    }
}

/// Decide the flag for a row from its stored flag and resolved category.
pub fn resolve_flag(existing: Option<FlagCategory>, category: Option<&str>) -> FlagDecision {
    if let Some(flag) = existing {
        return FlagDecision::Preserved(flag);
    }

    let reimbursable = category
        .is_some_and(|value| value.to_ascii_lowercase().contains(AUTO_FLAG_KEYWORD));
    if reimbursable {
        FlagDecision::AutoFlagged(FlagCategory::NeedsReview)
    } else {
        FlagDecision::Unflagged
    }
}
