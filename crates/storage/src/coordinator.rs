use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use augeo_core::status::{UNKNOWN, UNMATCHED};
use augeo_core::{
    BatchResult, EngineConfig, EnrichmentStatus, StatementStatus, TransactionStatus, WorkingRecord,
};

use crate::audit::{AuditEntry, AuditSink};
use crate::records::{EnrichmentRecord, StatementRow, TransactionRow};
use crate::store::{fetch, put, RowStore, StoreError};

/// Terminal accounting for one statement group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementOutcome {
    pub statement_id: String,
    pub status: StatementStatus,
    pub success_count: u32,
    pub failure_count: u32,
}

/// Batch-level aggregate returned to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistSummary {
    pub records_persisted: usize,
    pub records_failed: usize,
    pub statements_processed: usize,
    pub statements_with_errors: usize,
    pub statements: Vec<StatementOutcome>,
}

/// Converts pipeline outcomes into persisted enrichment records and
/// consistent statement/transaction state transitions.
///
/// Containment mirrors the pipeline boundary: a persistence fault on one
/// transaction is counted against its statement and processing moves on.
/// Every statement the batch touched is driven out of `processing` into a
/// terminal state.
///
/// The write sequence per transaction (enrichment upsert, then transaction
/// status, then the statement at group end) is not atomic; the enrichment
/// row is keyed by transaction id, so re-running a statement after a crash
/// overwrites rather than duplicates and the sequence is safe to resume.
/// Runs over the same statement must be externally serialized; there is
/// no compare-and-swap guard against double pickup.
pub struct StateCoordinator<'a> {
    store: &'a dyn RowStore,
    audit: &'a dyn AuditSink,
    config: EngineConfig,
}

impl<'a> StateCoordinator<'a> {
    pub fn new(store: &'a dyn RowStore, audit: &'a dyn AuditSink, config: EngineConfig) -> Self {
        StateCoordinator {
            store,
            audit,
            config,
        }
    }

    pub fn persist_batch(
        &self,
        records: &[WorkingRecord],
        batch: &BatchResult,
    ) -> PersistSummary {
        let mut summary = PersistSummary::default();

        for (statement_id, group) in group_by_statement(records) {
            let outcome = self.persist_statement(&statement_id, &group, batch, &mut summary);
            if outcome.status == StatementStatus::Processed {
                summary.statements_processed += 1;
            } else {
                summary.statements_with_errors += 1;
            }
            summary.statements.push(outcome);
        }

        tracing::info!(
            persisted = summary.records_persisted,
            failed = summary.records_failed,
            statements = summary.statements.len(),
            with_errors = summary.statements_with_errors,
            "batch persistence finished"
        );
        summary
    }

    fn persist_statement(
        &self,
        statement_id: &str,
        group: &[&WorkingRecord],
        batch: &BatchResult,
        summary: &mut PersistSummary,
    ) -> StatementOutcome {
        let mut success_count = 0u32;
        let mut failure_count = 0u32;

        for record in group.iter().copied() {
            let pipeline_ok = batch
                .result_for(&record.transaction_id)
                .is_some_and(|r| r.success);

            if !pipeline_ok {
                // A transaction that failed the pipeline is never partially
                // enriched; its source row keeps its pre-run status.
                failure_count += 1;
                summary.records_failed += 1;
                continue;
            }

            match self.persist_transaction(record) {
                Ok(status) => {
                    success_count += 1;
                    summary.records_persisted += 1;
                    self.audit.append(
                        AuditEntry::now(
                            &record.transaction_id,
                            match status {
                                EnrichmentStatus::ManualReview => "MANUAL_REVIEW",
                                _ => "ENRICHED",
                            },
                            format!(
                                "classified {} for statement {statement_id}",
                                record.internal_type.as_deref().unwrap_or("-")
                            ),
                        ),
                    );
                }
                Err(fault) => {
                    tracing::warn!(
                        tx = %record.transaction_id,
                        error = %fault,
                        "persistence fault contained"
                    );
                    failure_count += 1;
                    summary.records_failed += 1;
                    self.mark_transaction_failed(&record.transaction_id);
                    self.audit.append(AuditEntry::now(
                        &record.transaction_id,
                        "ENRICH_FAILED",
                        fault.to_string(),
                    ));
                }
            }
        }

        let status = if failure_count == 0 {
            StatementStatus::Processed
        } else {
            StatementStatus::ProcessedWithErrors
        };
        self.finish_statement(statement_id, status, group.len() as u32, success_count, failure_count);

        StatementOutcome {
            statement_id: statement_id.to_string(),
            status,
            success_count,
            failure_count,
        }
    }

    /// Enrichment upsert plus source-transaction transition for one
    /// successfully piped record.
    fn persist_transaction(&self, record: &WorkingRecord) -> Result<EnrichmentStatus, StoreError> {
        let status = if self.needs_review(record) {
            EnrichmentStatus::ManualReview
        } else {
            EnrichmentStatus::Enriched
        };
        let enrichment = EnrichmentRecord::from_record(record, status);

        // Keyed by transaction id: re-running after a partial write
        // overwrites instead of duplicating.
        put(
            self.store,
            &self.config.collections.enrichments,
            &record.transaction_id,
            &enrichment,
        )?;

        let collection = &self.config.collections.transactions;
        let mut row: TransactionRow = fetch(self.store, collection, &record.transaction_id)?
            .ok_or_else(|| StoreError::Missing {
                collection: collection.clone(),
                id: record.transaction_id.clone(),
            })?;
        row.status = TransactionStatus::Enriched;
        put(self.store, collection, &record.transaction_id, &row)?;

        Ok(status)
    }

    fn needs_review(&self, record: &WorkingRecord) -> bool {
        record.counterparty_id.as_deref() == Some(UNKNOWN)
            || record.customer_id.as_deref() == Some(UNKNOWN)
            || record.internal_type.as_deref() == Some(UNMATCHED)
            || record
                .customer_confidence
                .is_some_and(|c| c < self.config.review_confidence_floor)
    }

    /// Best effort: the source row notes the failure when the store still
    /// answers; when it does not, the warn above is all we have.
    fn mark_transaction_failed(&self, transaction_id: &str) {
        let collection = &self.config.collections.transactions;
        match fetch::<TransactionRow>(self.store, collection, transaction_id) {
            Ok(Some(mut row)) => {
                row.status = TransactionStatus::Failed;
                if let Err(error) = put(self.store, collection, transaction_id, &row) {
                    tracing::warn!(tx = %transaction_id, %error, "could not mark transaction failed");
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(tx = %transaction_id, %error, "could not mark transaction failed");
            }
        }
    }

    fn finish_statement(
        &self,
        statement_id: &str,
        status: StatementStatus,
        total: u32,
        success_count: u32,
        failure_count: u32,
    ) {
        let collection = &self.config.collections.statements;
        let result = fetch::<StatementRow>(self.store, collection, statement_id).and_then(|row| {
            let mut row = row.ok_or_else(|| StoreError::Missing {
                collection: collection.clone(),
                id: statement_id.to_string(),
            })?;
            row.status = status;
            row.total_count = total;
            row.success_count = success_count;
            row.failure_count = failure_count;
            row.finished_at = Some(Utc::now());
            put(self.store, collection, statement_id, &row)
        });

        match result {
            Ok(()) => {
                tracing::info!(
                    statement = %statement_id,
                    %status,
                    success_count,
                    failure_count,
                    "statement completed"
                );
                self.audit.append(AuditEntry::now(
                    statement_id,
                    match status {
                        StatementStatus::Processed => "STATEMENT_PROCESSED",
                        _ => "STATEMENT_PROCESSED_WITH_ERRORS",
                    },
                    format!("{success_count} succeeded, {failure_count} failed"),
                ));
            }
            Err(error) => {
                // The statement stays in `processing` in the store; nothing
                // more this run can do beyond shouting about it.
                tracing::error!(statement = %statement_id, %error, "could not finish statement");
            }
        }
    }
}

/// Groups records by statement id, preserving the loader's statement and
/// per-statement transaction order.
fn group_by_statement(records: &[WorkingRecord]) -> Vec<(String, Vec<&WorkingRecord>)> {
    let mut groups: Vec<(String, Vec<&WorkingRecord>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.statement_id.as_str()) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(record.statement_id.as_str(), groups.len());
                groups.push((record.statement_id.clone(), vec![record]));
            }
        }
    }
    groups
}
