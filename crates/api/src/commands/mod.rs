//! Route handlers
//!
//! Every handler takes the shared [`AppContext`](crate::AppContext) as state
//! and returns JSON.

pub mod health;
pub mod ledger;
pub mod notify;
pub mod sync;

pub use health::health;
pub use ledger::{list_ledger, set_flag};
pub use notify::notify;
pub use sync::{list_runs, sync_bills, sync_card};
