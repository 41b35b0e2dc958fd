//! Macro for implementing Display and FromStr for label enums
//!
//! Ledger and sync-run enums are persisted and exchanged as their display
//! labels (`"Needs Review"`, `"partial"`, `"Credit Card"`). This macro keeps
//! the Display and FromStr sides of that mapping in one place.
//!
//! # Example
//!
//! ```rust
//! use spendledger_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RunState {
//!     Running,
//!     Done,
//! }
//!
//! impl_domain_status_conversions!(RunState {
//!     Running => "running",
//!     Done => "done",
//! });
//!
//! assert_eq!("DONE".parse::<RunState>().unwrap(), RunState::Done);
//! ```

/// Implements Display and FromStr traits for label enums
///
/// This macro generates:
/// - Display trait: writes the exact label given for each variant
/// - FromStr trait: parses labels ignoring ASCII case and surrounding
///   whitespace
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their labels
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Label used for storage and display.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestLabel {
        NeedsReview,
        Done,
    }

    impl_domain_status_conversions!(TestLabel {
        NeedsReview => "Needs Review",
        Done => "done",
    });

    #[test]
    fn display_uses_exact_label() {
        assert_eq!(TestLabel::NeedsReview.to_string(), "Needs Review");
        assert_eq!(TestLabel::Done.as_str(), "done");
    }

    #[test]
    fn fromstr_ignores_case_and_whitespace() {
        assert_eq!(TestLabel::from_str("needs review").unwrap(), TestLabel::NeedsReview);
        assert_eq!(TestLabel::from_str("  DONE ").unwrap(), TestLabel::Done);
    }

    #[test]
    fn fromstr_invalid() {
        let result = TestLabel::from_str("Needs-Review");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid TestLabel: Needs-Review"));
    }

    #[test]
    fn fromstr_empty() {
        assert!(TestLabel::from_str("").is_err());
    }
}
