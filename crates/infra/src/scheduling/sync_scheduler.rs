//! Scheduled reconciliation runs.
//!
//! Each tick runs every registered work-set source through the sync pipeline
//! in order (card before bills). Runs that do not finish cleanly can be
//! announced on the chat webhook.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use spendledger_core::{SyncPipeline, WorkSetSource};
//! use spendledger_infra::scheduling::{SchedulerResult, SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(pipeline: Arc<SyncPipeline>, card: Arc<dyn WorkSetSource>) -> SchedulerResult<()> {
//! let mut scheduler = SyncScheduler::new(
//!     SyncSchedulerConfig { cron_expression: "0 0 */4 * * *".into(), ..Default::default() },
//!     pipeline,
//!     vec![card],
//!     None,
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use spendledger_core::{ChatMessage, ChatNotifier, SyncPipeline, WorkSetSource};
use spendledger_domain::config::SyncConfig;
use spendledger_domain::{SyncReport, SyncRunStatus};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression (with seconds) describing the schedule.
    pub cron_expression: String,
    /// How long one tick may take before an overrun is logged. Runs that are
    /// already started are never cancelled.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            cron_expression: config.cron_expression.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Everything one tick needs, shared with the cron closure.
#[derive(Clone)]
struct TickContext {
    pipeline: Arc<SyncPipeline>,
    sources: Arc<Vec<Arc<dyn WorkSetSource>>>,
    notifier: Option<Arc<dyn ChatNotifier>>,
}

/// Cron scheduler for reconciliation runs with explicit lifecycle management.
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    context: TickContext,
}

impl SyncScheduler {
    pub fn new(
        config: SyncSchedulerConfig,
        pipeline: Arc<SyncPipeline>,
        sources: Vec<Arc<dyn WorkSetSource>>,
        notifier: Option<Arc<dyn ChatNotifier>>,
    ) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            context: TickContext { pipeline, sources: Arc::new(sources), notifier },
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(Self::monitor_task(cancel)));

        info!(scheduler = "sync", event = "start", sources = self.context.sources.len(), "sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!(scheduler = "sync", event = "stop", "sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Run every source once, outside the cron schedule.
    pub async fn run_now(&self) -> Vec<SyncReport> {
        Self::run_sources(&self.context).await
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;
        let context = self.context.clone();
        let job_timeout = self.config.job_timeout;

        let job = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let context = context.clone();

            Box::pin(async move {
                Self::run_tick(context, job_timeout).await;
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job.guid();
        scheduler.add(job).await.map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, %job_id, "registered sync job");
        Ok(scheduler)
    }

    /// One scheduled tick. The runs are spawned so that exceeding
    /// `job_timeout` only logs; a started run always reaches a terminal row.
    async fn run_tick(context: TickContext, job_timeout: Duration) -> Vec<SyncReport> {
        let started = Instant::now();
        let mut handle = tokio::spawn(async move { Self::run_sources(&context).await });

        let joined = match tokio::time::timeout(job_timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    scheduler = "sync",
                    event = "job_overrun",
                    timeout_secs = job_timeout.as_secs(),
                    "scheduled sync exceeded its timeout; letting the runs finish"
                );
                handle.await
            }
        };

        match joined {
            Ok(reports) => {
                debug!(
                    scheduler = "sync",
                    event = "job_complete",
                    runs = reports.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "scheduled sync finished"
                );
                reports
            }
            Err(err) => {
                error!(scheduler = "sync", event = "job_panicked", error = %err, "scheduled sync task failed");
                Vec::new()
            }
        }
    }

    async fn run_sources(context: &TickContext) -> Vec<SyncReport> {
        let mut reports = Vec::with_capacity(context.sources.len());

        for source in context.sources.iter() {
            let kind = source.kind();
            match context.pipeline.run(source.as_ref()).await {
                Ok(report) => {
                    if report.status != SyncRunStatus::Success {
                        Self::announce(context, &report).await;
                    }
                    reports.push(report);
                }
                Err(err) => {
                    error!(scheduler = "sync", %kind, error = %err, "sync run could not be started");
                }
            }
        }

        reports
    }

    async fn announce(context: &TickContext, report: &SyncReport) {
        let Some(notifier) = context.notifier.as_ref() else {
            return;
        };
        if let Err(err) = notifier.notify(&ChatMessage::run_summary(report)).await {
            warn!(scheduler = "sync", run_id = %report.run_id, error = %err, "run summary not delivered");
        }
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!(scheduler = "sync", event = "monitor_cancelled", "sync scheduler monitor cancelled");
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!(
                scheduler = "sync",
                event = "drop_cancel",
                "SyncScheduler dropped while running; cancelling tasks"
            );
            self.cancellation.cancel();
        }
    }
}
