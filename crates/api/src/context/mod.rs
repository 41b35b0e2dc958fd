//! Application context - dependency injection container

use std::sync::Arc;

use spendledger_core::{ChatNotifier, LedgerStore, ReconcileService, SyncPipeline, SyncRunLog, WorkSetSource};
use spendledger_domain::{Config, Result};
use spendledger_infra::integrations::{
    BillSyncRequest, BillWorkSetSource, CardClient, CardSyncRequest, CardWorkSetSource, ErpClient,
    FetchMode, SlackNotifier,
};
use spendledger_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
use spendledger_infra::{DbManager, SqliteLedgerStore, SqliteSyncRunLog};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub ledger: Arc<dyn LedgerStore>,
    pub run_log: Arc<dyn SyncRunLog>,
    pub pipeline: Arc<SyncPipeline>,
    pub card_client: Arc<CardClient>,
    pub erp_client: Arc<ErpClient>,
    /// `None` when no chat webhook is configured.
    pub notifier: Option<Arc<dyn ChatNotifier>>,
}

impl AppContext {
    /// Open the ledger database and build every client from `config`.
    ///
    /// No upstream is contacted here.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedgerStore::new(db.clone()));
        let run_log: Arc<dyn SyncRunLog> = Arc::new(SqliteSyncRunLog::new(db.clone()));
        let reconciler = Arc::new(
            ReconcileService::new(ledger.clone(), config.branches.clone())
                .with_flag_lookup_chunk(config.sync.flag_lookup_chunk),
        );
        let pipeline = Arc::new(SyncPipeline::new(reconciler, run_log.clone()));

        let card_client = Arc::new(CardClient::new(&config.card)?);
        let erp_client = Arc::new(ErpClient::new(&config.erp)?);
        let notifier = SlackNotifier::from_config(&config.slack)?
            .map(|notifier| Arc::new(notifier) as Arc<dyn ChatNotifier>);

        info!(
            db_path = %config.database.path,
            notifier = notifier.is_some(),
            "application context initialised"
        );

        Ok(Self { config, db, ledger, run_log, pipeline, card_client, erp_client, notifier })
    }

    /// Card source for one run.
    pub fn card_source(&self, request: CardSyncRequest) -> CardWorkSetSource {
        CardWorkSetSource::new(self.card_client.clone(), self.config.card.field_names.clone(), request)
    }

    /// Vendor-bill source for one run.
    pub fn bill_source(&self, request: BillSyncRequest) -> BillWorkSetSource {
        BillWorkSetSource::new(self.erp_client.clone(), request)
    }

    /// Card request built from configured defaults.
    pub fn default_card_request(&self) -> CardSyncRequest {
        CardSyncRequest {
            days_back: self.config.card.default_days_back,
            include_incomplete: self.config.card.include_incomplete,
            mode: FetchMode::Routine,
        }
    }

    pub fn default_bill_request(&self) -> BillSyncRequest {
        BillSyncRequest { days_back: self.config.erp.default_days_back }
    }

    /// Scheduler running the card source, then the bill source, on the
    /// configured cron expression. Not started.
    pub fn scheduler(&self) -> SyncScheduler {
        let sources: Vec<Arc<dyn WorkSetSource>> = vec![
            Arc::new(self.card_source(self.default_card_request())),
            Arc::new(self.bill_source(self.default_bill_request())),
        ];
        let notifier =
            if self.config.slack.notify_on_scheduled_runs { self.notifier.clone() } else { None };

        SyncScheduler::new(
            SyncSchedulerConfig::from(&self.config.sync),
            self.pipeline.clone(),
            sources,
            notifier,
        )
    }
}
