use thiserror::Error;

use augeo_core::{StepResult, WorkingRecord};

use crate::lookup::LookupError;

/// An unexpected fault inside a step.
///
/// Steps report expected business outcomes (unknown currency, no matching
/// rule) through [`StepResult`]; `StepError` is for the unexpected, like a
/// lookup backend going away. The pipeline converts it into a failed
/// `StepResult` at the boundary, so a fault never escapes past one record.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("{0}")]
    Internal(String),
}

/// One named, idempotent transformation over a working record.
///
/// Contract: `execute` must be idempotent (running a record through twice
/// with unchanged collaborators yields the same record and result), and
/// `should_execute == false` must leave the record untouched; the
/// pipeline records such steps as skipped successes.
pub trait Step {
    fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError>;

    /// Precondition gate; default is to always run.
    fn should_execute(&self, _record: &WorkingRecord) -> bool {
        true
    }

    /// Stable name used in results, side-table provenance, and audit trails.
    fn name(&self) -> &str;
}
