use std::cell::RefCell;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Transaction or statement the entry is about.
    pub subject_id: String,
    pub action: String,
    pub detail: String,
    pub step: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn now(subject_id: &str, action: &str, detail: impl Into<String>) -> Self {
        AuditEntry {
            subject_id: subject_id.to_string(),
            action: action.to_string(),
            detail: detail.into(),
            step: None,
            at: Utc::now(),
        }
    }

    pub fn with_step(mut self, step: &str) -> Self {
        self.step = Some(step.to_string());
        self
    }
}

/// Append-only audit trail. Sinks must not fail the batch: a sink that
/// cannot write should swallow and report through its own channel.
pub trait AuditSink {
    fn append(&self, entry: AuditEntry);
}

/// Collects entries in memory; the default for tests and embedders that
/// flush the trail themselves.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: RefCell<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.borrow().clone()
    }

    pub fn actions_for(&self, subject_id: &str) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .map(|e| e.action.clone())
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, entry: AuditEntry) {
        self.entries.borrow_mut().push(entry);
    }
}

/// Writes the audit trail to the `tracing` subscriber; useful when no
/// store-backed sink is wired up.
#[derive(Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn append(&self, entry: AuditEntry) {
        tracing::info!(
            subject = %entry.subject_id,
            action = %entry.action,
            step = entry.step.as_deref().unwrap_or("-"),
            "{}",
            entry.detail
        );
    }
}
