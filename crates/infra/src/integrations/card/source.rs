//! Card work-set source: one query per sync-state partition, merged

use std::sync::Arc;

use async_trait::async_trait;
use spendledger_core::{merge_preferring_non_null, ReferenceData, WorkSet, WorkSetSource};
use spendledger_domain::config::CustomFieldNames;
use spendledger_domain::{Result, SyncKind, SyncState};
use tracing::info;

use super::client::{CardClient, FetchMode, TransactionQuery};
use super::resolvers::{custom_field_ids, user_names};

/// Parameters of one card sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSyncRequest {
    pub days_back: u32,
    pub include_incomplete: bool,
    pub mode: FetchMode,
}

/// Fetches every partition for a card sync and the reference tables it needs.
pub struct CardWorkSetSource {
    client: Arc<CardClient>,
    field_names: CustomFieldNames,
    request: CardSyncRequest,
}

impl CardWorkSetSource {
    pub fn new(client: Arc<CardClient>, field_names: CustomFieldNames, request: CardSyncRequest) -> Self {
        Self { client, field_names, request }
    }
}

#[async_trait]
impl WorkSetSource for CardWorkSetSource {
    fn kind(&self) -> SyncKind {
        match self.request.mode {
            FetchMode::Routine => SyncKind::Card,
            FetchMode::Historical => SyncKind::CardHistorical,
        }
    }

    async fn fetch_work_set(&self) -> Result<WorkSet> {
        let mut partitions = Vec::with_capacity(SyncState::ALL.len());
        let mut rejected = Vec::new();
        for state in SyncState::ALL {
            let query = TransactionQuery {
                days_back: self.request.days_back,
                sync_state: Some(state),
                include_incomplete: self.request.include_incomplete,
                mode: self.request.mode,
            };
            let batch = self.client.fetch_transactions(&query).await?;
            partitions.push(batch.records);
            rejected.extend(batch.rejected);
        }

        let fetched: usize = partitions.iter().map(Vec::len).sum();
        let records = merge_preferring_non_null(partitions);
        info!(fetched, unique = records.len(), rejected = rejected.len(), "card partitions merged");

        let references = ReferenceData {
            user_names: user_names(&self.client).await?,
            field_ids: custom_field_ids(&self.client, &self.field_names).await?,
        };

        Ok(WorkSet { records, references, rejected })
    }
}
