use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use augeo_core::{
    EnrichmentStatus, PairingStatus, SourceType, StatementStatus, TransactionStatus, WorkingRecord,
};

/// Statement row as persisted: the batch-level grouping of transactions
/// from one source feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRow {
    pub id: String,
    pub source: SourceType,
    pub status: StatementStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub failure_count: u32,
}

impl StatementRow {
    pub fn new(id: &str, source: SourceType) -> Self {
        StatementRow {
            id: id.to_string(),
            source,
            status: StatementStatus::New,
            started_at: None,
            finished_at: None,
            total_count: 0,
            success_count: 0,
            failure_count: 0,
        }
    }
}

/// Source transaction row; only the status ever changes after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub statement_id: String,
    pub source: SourceType,
    pub status: TransactionStatus,
}

impl TransactionRow {
    pub fn new(id: &str, statement_id: &str, source: SourceType) -> Self {
        TransactionRow {
            id: id.to_string(),
            statement_id: statement_id.to_string(),
            source,
            status: TransactionStatus::New,
        }
    }
}

/// Persisted enrichment output for one transaction.
///
/// Written at most once per transaction per run, keyed by transaction id,
/// and immutable afterwards except for `pairing_status`, which the
/// downstream pairing workflow owns exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub id: String,
    pub transaction_id: String,
    pub statement_id: String,
    pub source: SourceType,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub base_amount: Option<Decimal>,
    pub counterparty_id: Option<String>,
    pub counterparty_bic: Option<String>,
    pub counterparty_name: Option<String>,
    pub customer_id: Option<String>,
    pub customer_confidence: Option<f32>,
    pub internal_type: Option<String>,
    pub processing_status: EnrichmentStatus,
    pub pairing_status: PairingStatus,
    pub created_at: DateTime<Utc>,
}

impl EnrichmentRecord {
    pub fn from_record(record: &WorkingRecord, processing_status: EnrichmentStatus) -> Self {
        EnrichmentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_id: record.transaction_id.clone(),
            statement_id: record.statement_id.clone(),
            source: record.source,
            currency: record.currency.clone(),
            amount: record.amount,
            base_amount: record.base_amount,
            counterparty_id: record.counterparty_id.clone(),
            counterparty_bic: record.counterparty_bic.clone(),
            counterparty_name: record.counterparty_name.clone(),
            customer_id: record.customer_id.clone(),
            customer_confidence: record.customer_confidence,
            internal_type: record.internal_type.clone(),
            processing_status,
            pairing_status: PairingStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
