use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel written into a derived field when master-data resolution found nothing.
pub const UNKNOWN: &str = "UNKNOWN";

/// Sentinel classification code when no rule matched.
pub const UNMATCHED: &str = "UNMATCHED";

/// Per-run label on a [`crate::WorkingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Pending,
    Enriched,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    New,
    Processing,
    Processed,
    ProcessedWithErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    New,
    Enriched,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Enriched,
    ManualReview,
    Failed,
}

/// Owned by the downstream pairing workflow; this engine only ever writes `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStatus {
    #[default]
    Pending,
    Paired,
    Unpairable,
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementStatus::New => write!(f, "new"),
            StatementStatus::Processing => write!(f, "processing"),
            StatementStatus::Processed => write!(f, "processed"),
            StatementStatus::ProcessedWithErrors => write!(f, "processed_with_errors"),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::New => write!(f, "new"),
            TransactionStatus::Enriched => write!(f, "enriched"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentStatus::Enriched => write!(f, "enriched"),
            EnrichmentStatus::ManualReview => write!(f, "manual_review"),
            EnrichmentStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_status_serializes_snake_case() {
        let s = serde_json::to_string(&StatementStatus::ProcessedWithErrors).unwrap();
        assert_eq!(s, "\"processed_with_errors\"");
    }

    #[test]
    fn enrichment_status_round_trips() {
        let s: EnrichmentStatus = serde_json::from_str("\"manual_review\"").unwrap();
        assert_eq!(s, EnrichmentStatus::ManualReview);
    }

    #[test]
    fn display_matches_serde_string() {
        assert_eq!(StatementStatus::Processed.to_string(), "processed");
        assert_eq!(TransactionStatus::Enriched.to_string(), "enriched");
        assert_eq!(EnrichmentStatus::ManualReview.to_string(), "manual_review");
    }
}
