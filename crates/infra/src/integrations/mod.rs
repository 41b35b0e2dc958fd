//! Upstream integrations
//!
//! - [`card`]: card-spend platform transactions and reference lookups
//! - [`erp`]: ERP vendor bills over OAuth 1.0a signed REST calls
//! - [`slack`]: chat webhook notifier

pub mod amount;
pub mod card;
pub mod erp;
pub mod slack;

pub use card::{CardClient, CardSyncRequest, CardWorkSetSource, FetchMode, TransactionQuery};
pub use erp::{BillSyncRequest, BillWorkSetSource, ErpClient, OAuthSigner, VendorNames};
pub use slack::SlackNotifier;
