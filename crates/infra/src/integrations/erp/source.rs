//! Vendor-bill work-set source
//!
//! One paginated header query, then per-bill detail and expense-line fetches.
//! A failed detail fetch leaves the bill's fields empty; only the header query
//! can abort the run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use spendledger_core::{ReferenceData, WorkSet, WorkSetSource};
use spendledger_domain::{ExternalRecord, RecordError, ResolvedFields, Result, SourceKind, SyncKind};
use tracing::{info, warn};

use super::client::ErpClient;
use super::vendors::VendorNames;
use crate::integrations::amount::minor_units;

/// Parameters of one vendor-bill sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillSyncRequest {
    pub days_back: u32,
}

/// Fetches vendor bills and the fields reviewers need from each one.
pub struct BillWorkSetSource {
    client: Arc<ErpClient>,
    request: BillSyncRequest,
}

impl BillWorkSetSource {
    pub fn new(client: Arc<ErpClient>, request: BillSyncRequest) -> Self {
        Self { client, request }
    }

    /// Header query for bills dated on or after `floor`.
    pub fn header_query(floor: NaiveDate) -> String {
        format!(
            "SELECT t.id, t.tranid, t.trandate, t.entity, t.foreigntotal, t.memo, \
             BUILTIN.DF(t.status) AS status, BUILTIN.DF(t.currency) AS currency \
             FROM transaction t \
             WHERE t.type = 'VendBill' AND t.trandate >= TO_DATE('{}', 'YYYY-MM-DD') \
             ORDER BY t.trandate DESC, t.id DESC",
            floor.format("%Y-%m-%d")
        )
    }

    async fn bill_fields(&self, bill_id: &str) -> ResolvedFields {
        match self.fetch_bill_fields(bill_id).await {
            Ok(fields) => fields,
            Err(err) => {
                warn!(bill_id, error = %err, "bill detail unavailable; using empty fields");
                ResolvedFields::default()
            }
        }
    }

    async fn fetch_bill_fields(&self, bill_id: &str) -> Result<ResolvedFields> {
        let detail: BillDetail = self.client.record(&format!("vendorBill/{bill_id}")).await?;
        let lines: ExpenseLines = self.client.record(&format!("vendorBill/{bill_id}/expense")).await?;

        let from_detail = ResolvedFields {
            branch: ref_name(detail.location),
            department: ref_name(detail.department),
            category: None,
            memo: detail.memo.filter(|m| !m.trim().is_empty()),
        };
        let from_line = lines
            .items
            .into_iter()
            .next()
            .map(|line| ResolvedFields {
                branch: ref_name(line.location),
                department: ref_name(line.department),
                category: ref_name(line.category).or_else(|| ref_name(line.account)),
                memo: line.memo.filter(|m| !m.trim().is_empty()),
            })
            .unwrap_or_default();

        Ok(from_detail.or(from_line))
    }
}

#[async_trait]
impl WorkSetSource for BillWorkSetSource {
    fn kind(&self) -> SyncKind {
        SyncKind::Bills
    }

    async fn fetch_work_set(&self) -> Result<WorkSet> {
        let floor = Utc::now().date_naive() - Duration::days(i64::from(self.request.days_back));
        let headers: Vec<BillHeader> = self.client.suiteql(&Self::header_query(floor)).await?;
        info!(bills = headers.len(), %floor, "vendor bill headers fetched");

        let mut vendors = VendorNames::new();
        let mut records = Vec::with_capacity(headers.len());
        let mut rejected = Vec::new();

        for header in headers {
            let vendor = vendors.resolve(&self.client, header.entity.as_deref()).await;
            let amount_cents = match header.foreigntotal.as_ref().map(minor_units) {
                Some(Ok(cents)) => cents,
                Some(Err(err)) => {
                    warn!(bill_id = %header.id, error = %err, "bill has an unreadable total");
                    rejected.push(RecordError::for_record(
                        SourceKind::VendorBill.ledger_id(&header.id),
                        vendor,
                        format!("unreadable total: {err}"),
                    ));
                    continue;
                }
                None => {
                    warn!(bill_id = %header.id, "bill has no total");
                    rejected.push(RecordError::for_record(
                        SourceKind::VendorBill.ledger_id(&header.id),
                        vendor,
                        "bill has no total",
                    ));
                    continue;
                }
            };

            let mut record = ExternalRecord::new(
                SourceKind::VendorBill,
                header.id.clone(),
                header.trandate.clone(),
                amount_cents,
                vendor,
            );
            if let Some(currency) = header.currency.filter(|c| !c.trim().is_empty()) {
                record.currency = currency;
            }
            record.memo = header.memo.filter(|m| !m.trim().is_empty());
            record.status = header.status;
            record.prefilled = self.bill_fields(&header.id).await;
            records.push(record);
        }

        info!(
            records = records.len(),
            rejected = rejected.len(),
            vendors = vendors.len(),
            "vendor bills assembled"
        );
        Ok(WorkSet { records, references: ReferenceData::default(), rejected })
    }
}

#[derive(Debug, Deserialize)]
struct BillHeader {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    trandate: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    entity: Option<String>,
    #[serde(default)]
    foreigntotal: Option<Value>,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefName {
    #[serde(default)]
    ref_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BillDetail {
    #[serde(default)]
    department: Option<RefName>,
    #[serde(default)]
    location: Option<RefName>,
    #[serde(default)]
    memo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExpenseLines {
    #[serde(default)]
    items: Vec<ExpenseLine>,
}

#[derive(Debug, Deserialize)]
struct ExpenseLine {
    #[serde(default)]
    department: Option<RefName>,
    #[serde(default)]
    location: Option<RefName>,
    #[serde(default)]
    category: Option<RefName>,
    #[serde(default)]
    account: Option<RefName>,
    #[serde(default)]
    memo: Option<String>,
}

fn ref_name(value: Option<RefName>) -> Option<String> {
    value.and_then(|r| r.ref_name).filter(|name| !name.trim().is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}
