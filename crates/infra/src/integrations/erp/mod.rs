//! ERP vendor-bill integration

pub mod client;
pub mod oauth;
pub mod source;
pub mod vendors;

pub use client::ErpClient;
pub use oauth::OAuthSigner;
pub use source::{BillSyncRequest, BillWorkSetSource};
pub use vendors::{VendorNames, UNKNOWN_VENDOR};
