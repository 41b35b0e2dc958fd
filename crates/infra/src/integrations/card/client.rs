//! Card-spend platform REST client
//!
//! Transactions, users and custom fields share one pagination contract:
//! `GET <path>?limit=<n>&nextPage=<cursor>` returning `{data, nextPage}`.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use spendledger_domain::config::CardApiConfig;
use spendledger_domain::{
    CustomFieldEntry, ExternalRecord, LedgerError, RecordError, Result, SourceKind, SyncState,
};
use tracing::{debug, info, warn};

use crate::http::HttpClient;
use crate::integrations::amount::minor_units;

const SERVICE: &str = "card";
const SETTLED_LIFECYCLES: [&str; 2] = ["POSTED", "CLEARED"];

/// Page size and page ceiling for one kind of transaction pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size: u32,
    pub max_pages: u32,
}

/// Routine pulls cover recent weeks; historical pulls backfill long windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Routine,
    Historical,
}

/// One transaction listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionQuery {
    pub days_back: u32,
    /// Partition to query; `None` lists every sync state at once.
    pub sync_state: Option<SyncState>,
    pub include_incomplete: bool,
    pub mode: FetchMode,
}

impl TransactionQuery {
    /// Comma-joined `key:op:value` filter for the listing endpoint.
    pub fn filter_string(&self, today: NaiveDate) -> String {
        let floor = today - chrono::Duration::days(i64::from(self.days_back));
        let mut parts = vec![format!("occurredTime:gte:{}", floor.format("%Y-%m-%d"))];
        if let Some(state) = self.sync_state {
            parts.push(format!("syncStatus:eq:{}", state.as_filter_value()));
        }
        if !self.include_incomplete {
            parts.push("completionStatus:eq:COMPLETE".to_string());
        }
        parts.join(",")
    }
}

/// Settled transactions from one listing, split by whether they mapped.
#[derive(Debug, Default)]
pub struct TransactionBatch {
    pub records: Vec<ExternalRecord>,
    /// Settled transactions whose amount could not be read.
    pub rejected: Vec<RecordError>,
}

/// Client for the card-spend platform API.
pub struct CardClient {
    http: HttpClient,
    base_url: String,
    api_token: String,
    page_delay: Duration,
    timeout_secs: u64,
    routine: PageLimits,
    historical: PageLimits,
}

impl CardClient {
    pub fn new(config: &CardApiConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .service(SERVICE)
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(2)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            page_delay: Duration::from_millis(config.page_delay_ms),
            timeout_secs: config.timeout_secs,
            routine: PageLimits { page_size: config.page_size, max_pages: config.max_pages },
            historical: PageLimits {
                page_size: config.historical_page_size,
                max_pages: config.historical_max_pages,
            },
        })
    }

    pub fn limits(&self, mode: FetchMode) -> PageLimits {
        match mode {
            FetchMode::Routine => self.routine,
            FetchMode::Historical => self.historical,
        }
    }

    /// List settled transactions matching `query`.
    ///
    /// Records from a partitioned query are tagged with that partition.
    /// Pending authorizations and declines are dropped after the fetch since
    /// the API cannot filter on lifecycle. Settled transactions that cannot be
    /// mapped come back in `rejected`.
    pub async fn fetch_transactions(&self, query: &TransactionQuery) -> Result<TransactionBatch> {
        let filter = query.filter_string(Utc::now().date_naive());
        let limits = self.limits(query.mode);

        let raw: Vec<CardTransaction> =
            self.fetch_pages("transactions", &[("filter", filter.as_str())], limits).await?;
        let fetched = raw.len();

        let mut batch = TransactionBatch::default();
        for txn in raw.into_iter().filter(CardTransaction::is_settled) {
            match txn.into_record(query.sync_state) {
                Ok(record) => batch.records.push(record),
                Err(rejected) => batch.rejected.push(rejected),
            }
        }

        info!(
            sync_state = ?query.sync_state,
            mode = ?query.mode,
            fetched,
            kept = batch.records.len(),
            rejected = batch.rejected.len(),
            "card transactions fetched"
        );
        Ok(batch)
    }

    /// Follow `nextPage` cursors until exhausted or the page ceiling is hit.
    pub(crate) async fn fetch_pages<T>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        limits: PageLimits,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let limit = limits.page_size.to_string();
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..limits.max_pages.max(1) {
            if page > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let mut query: Vec<(&str, &str)> = vec![("limit", limit.as_str())];
            query.extend_from_slice(params);
            if let Some(next) = cursor.as_deref() {
                query.push(("nextPage", next));
            }

            let request = self
                .http
                .request(Method::GET, &url)
                .bearer_auth(&self.api_token)
                .query(&query);
            let body: Page<T> = self.http.send_json(request).await.map_err(|err| self.explain(err))?;

            debug!(path, page = page + 1, items = body.data.len(), "card page received");
            items.extend(body.data);

            cursor = body.next_page.filter(|next| !next.is_empty());
            if cursor.is_none() {
                return Ok(items);
            }
        }

        warn!(path, max_pages = limits.max_pages, "card page ceiling reached; results truncated");
        Ok(items)
    }

    fn explain(&self, err: LedgerError) -> LedgerError {
        match err {
            LedgerError::Timeout { .. } => LedgerError::Timeout {
                service: SERVICE.to_string(),
                message: format!(
                    "no response within {}s; retry with a smaller daysBack window",
                    self.timeout_secs
                ),
            },
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardTransaction {
    id: String,
    occurred_time: String,
    amount: Value,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    merchant_name: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    budget_id: Option<String>,
    #[serde(default)]
    transaction_type: Option<String>,
    #[serde(default)]
    completion_status: Option<String>,
    #[serde(default)]
    integration_status: Option<IntegrationStatus>,
    #[serde(default)]
    custom_fields: Vec<CardCustomField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntegrationStatus {
    #[serde(default)]
    sync_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardCustomField {
    custom_field_id: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    selected_values: Vec<SelectedValue>,
}

#[derive(Debug, Deserialize)]
struct SelectedValue {
    value: String,
}

impl CardTransaction {
    fn is_settled(&self) -> bool {
        self.transaction_type.as_deref().is_some_and(|lifecycle| {
            SETTLED_LIFECYCLES.iter().any(|settled| lifecycle.eq_ignore_ascii_case(settled))
        })
    }

    fn into_record(self, partition: Option<SyncState>) -> std::result::Result<ExternalRecord, RecordError> {
        let amount_cents = match minor_units(&self.amount) {
            Ok(cents) => cents,
            Err(err) => {
                warn!(transaction_id = %self.id, error = %err, "card transaction has an unreadable amount");
                return Err(RecordError::for_record(
                    SourceKind::CreditCard.ledger_id(&self.id),
                    self.merchant_name.unwrap_or_default(),
                    format!("unreadable amount: {err}"),
                ));
            }
        };

        let vendor = self.merchant_name.unwrap_or_default();
        let mut record =
            ExternalRecord::new(SourceKind::CreditCard, self.id, self.occurred_time, amount_cents, vendor);
        if let Some(currency) = self.currency.filter(|c| !c.trim().is_empty()) {
            record.currency = currency;
        }
        record.owner_ref = self.user_id;
        record.memo = self.memo.filter(|m| !m.trim().is_empty());
        record.budget_id = self.budget_id;
        record.status = self.completion_status;
        record.integration_status = self
            .integration_status
            .and_then(|status| status.sync_status)
            .and_then(|raw| SyncState::from_upstream(&raw));
        record.sync_state = partition;
        record.custom_fields = self
            .custom_fields
            .into_iter()
            .filter_map(|field| {
                let selected = field.selected_values.into_iter().next().map(|v| v.value);
                match (selected, field.note) {
                    (Some(value), _) => Some(CustomFieldEntry::selected(field.custom_field_id, value)),
                    (None, Some(note)) => Some(CustomFieldEntry::text(field.custom_field_id, note)),
                    (None, None) => None,
                }
            })
            .collect();

        Ok(record)
    }
}
