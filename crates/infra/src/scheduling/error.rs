//! Scheduler error types

use std::time::Duration;

use spendledger_domain::LedgerError;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio_cron_scheduler::JobSchedulerError;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("scheduler not running")]
    NotRunning,

    #[error("failed to create scheduler: {source}")]
    CreationFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("failed to start scheduler: {source}")]
    StartFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("failed to stop scheduler: {source}")]
    StopFailed {
        #[source]
        source: JobSchedulerError,
    },

    /// Invalid cron expression or rejected job
    #[error("failed to register job: {source}")]
    JobRegistrationFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: Elapsed,
    },

    #[error("task join failed: {0}")]
    TaskJoinFailed(#[from] JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let ledger_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                LedgerError::InvalidInput(err.to_string())
            }
            SchedulerError::JobRegistrationFailed { .. } => LedgerError::Config(err.to_string()),
            _ => LedgerError::Internal(err.to_string()),
        };
        InfraError(ledger_err)
    }
}

impl From<SchedulerError> for LedgerError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
