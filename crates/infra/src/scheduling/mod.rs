//! Cron-driven reconciliation runs
//!
//! The scheduler owns its `JobScheduler`, a monitor task and a cancellation
//! token; `start` and `stop` are explicit and every lifecycle step is wrapped
//! in a timeout.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{SyncScheduler, SyncSchedulerConfig};
