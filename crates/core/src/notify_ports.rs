//! Port interfaces for chat notifications

use async_trait::async_trait;
use spendledger_domain::{LedgerRecord, Result, SyncReport, SyncRunStatus};

/// A chat message: a headline plus labelled fields rendered as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub fields: Vec<(String, String)>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), fields: Vec::new() }
    }

    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((label.into(), value.into()));
        self
    }

    /// Summary of a finished run.
    pub fn run_summary(report: &SyncReport) -> Self {
        let headline = match report.status {
            SyncRunStatus::Success => "completed",
            SyncRunStatus::Partial => "completed with errors",
            SyncRunStatus::Failed => "failed",
            SyncRunStatus::Running => "is still running",
        };

        let mut message = Self::new(format!("Expense sync ({}) {headline}", report.kind))
            .with_field("Run", report.run_id.to_string())
            .with_field("Fetched", report.fetched.to_string())
            .with_field("Created", report.created.to_string())
            .with_field("Updated", report.updated.to_string())
            .with_field("Flags preserved", report.flags_preserved.to_string());

        if let Some(first) = report.errors.first() {
            let subject = first.record_id.as_deref().unwrap_or("run");
            message = message
                .with_field("Errors", report.errors.len().to_string())
                .with_field("First error", format!("{subject}: {}", first.message));
        }
        message
    }

    /// A reviewer note about one ledger row.
    pub fn ledger_record(record: &LedgerRecord, note: impl Into<String>) -> Self {
        let amount = format!(
            "{}{}.{:02} {}",
            if record.amount_cents < 0 { "-" } else { "" },
            record.amount_cents.unsigned_abs() / 100,
            record.amount_cents.unsigned_abs() % 100,
            record.currency
        );

        let mut message = Self::new(note)
            .with_field("Record", record.id.clone())
            .with_field("Vendor", record.vendor_name.clone())
            .with_field("Amount", amount)
            .with_field("Date", record.transaction_date.to_string());
        if let Some(flag) = record.flag_category {
            message = message.with_field("Flag", flag.to_string());
        }
        message
    }
}

/// Trait for posting messages to a team chat channel
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn notify(&self, message: &ChatMessage) -> Result<()>;
}
