use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::FieldValue;

/// Outcome of one step over one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub skipped: bool,
    pub message: String,
    /// Values the step wants on the per-step audit trail beyond what it
    /// wrote into the record.
    pub outputs: BTreeMap<String, FieldValue>,
}

impl StepResult {
    pub fn ok(message: impl Into<String>) -> Self {
        StepResult {
            success: true,
            skipped: false,
            message: message.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        StepResult {
            success: false,
            skipped: false,
            message: message.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        StepResult {
            success: true,
            skipped: true,
            message: message.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_output(mut self, key: &str, value: FieldValue) -> Self {
        self.outputs.insert(key.to_string(), value);
        self
    }
}

/// A step's result in pipeline order, keyed by the step's stable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub result: StepResult,
}

/// Per-transaction aggregate over the whole step chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub transaction_id: String,
    pub success: bool,
    /// Set only when the pipeline stopped early; names the failing step's
    /// message.
    pub error: Option<String>,
    /// The step the pipeline halted on, when stop-on-error tripped.
    pub halted_at: Option<String>,
    pub steps: Vec<StepOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|o| o.step == name).map(|o| &o.result)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|o| !o.result.success)
    }
}

/// Aggregate over one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per working record, in loader order.
    pub results: Vec<PipelineResult>,
}

impl BatchResult {
    pub fn result_for(&self, transaction_id: &str) -> Option<&PipelineResult> {
        self.results.iter().find(|r| r.transaction_id == transaction_id)
    }
}
