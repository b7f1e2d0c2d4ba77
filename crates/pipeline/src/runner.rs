use chrono::Utc;

use augeo_core::{BatchResult, WorkingRecord};

use crate::pipeline::Pipeline;

/// Drives one pipeline over many working records, strictly sequentially
/// and strictly in the order the loader supplied them.
pub struct BatchRunner<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        BatchRunner { pipeline }
    }

    pub fn run(&self, records: &mut [WorkingRecord]) -> BatchResult {
        let started_at = Utc::now();
        tracing::info!(records = records.len(), "batch run started");

        let mut results = Vec::with_capacity(records.len());
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for record in records.iter_mut() {
            let result = self.pipeline.execute(record);
            if result.success {
                succeeded += 1;
            } else {
                failed += 1;
            }
            results.push(result);
        }

        let batch = BatchResult {
            total: results.len(),
            succeeded,
            failed,
            started_at,
            finished_at: Utc::now(),
            results,
        };
        tracing::info!(
            total = batch.total,
            succeeded = batch.succeeded,
            failed = batch.failed,
            "batch run finished"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{Step, StepError};
    use augeo_core::{SourceType, StepResult};

    /// Fails exactly the records whose description says so; order-preserving.
    struct MarkStep;

    impl Step for MarkStep {
        fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
            if record.description.as_deref() == Some("fail me") {
                Ok(StepResult::failure("asked to fail"))
            } else {
                Ok(StepResult::ok("fine"))
            }
        }

        fn name(&self) -> &str {
            "mark"
        }
    }

    fn record(id: &str, description: &str) -> WorkingRecord {
        let mut r = WorkingRecord::new(id, "st-1", SourceType::Bank);
        r.description = Some(description.to_string());
        r
    }

    #[test]
    fn aggregates_counts_and_preserves_order() {
        let pipeline = Pipeline::builder().add_step(MarkStep).build().unwrap();
        let runner = BatchRunner::new(&pipeline);
        let mut records = vec![
            record("tx-1", "ok"),
            record("tx-2", "fail me"),
            record("tx-3", "ok"),
        ];
        let batch = runner.run(&mut records);

        assert_eq!(batch.total, 3);
        assert_eq!(batch.succeeded, 2);
        assert_eq!(batch.failed, 1);
        let ids: Vec<_> = batch
            .results
            .iter()
            .map(|r| r.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["tx-1", "tx-2", "tx-3"]);
        assert!(!batch.result_for("tx-2").unwrap().success);
    }

    #[test]
    fn empty_batch_is_a_clean_zero() {
        let pipeline = Pipeline::builder().add_step(MarkStep).build().unwrap();
        let batch = BatchRunner::new(&pipeline).run(&mut []);
        assert_eq!(batch.total, 0);
        assert_eq!(batch.succeeded, 0);
        assert_eq!(batch.failed, 0);
    }
}
