use chrono::Utc;
use thiserror::Error;

use augeo_core::{PipelineResult, RecordStatus, StepOutcome, StepResult, WorkingRecord};

use crate::step::Step;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An empty pipeline would "process" every record by doing nothing, so
    /// building one is refused outright.
    #[error("Pipeline has no steps configured")]
    EmptyPipeline,
}

pub struct PipelineBuilder {
    steps: Vec<Box<dyn Step>>,
    stop_on_error: bool,
}

impl PipelineBuilder {
    pub fn add_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn add_boxed_step(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// `false` runs every step even after a failure; the record still ends
    /// up failed overall, but consumers get the full per-step trail.
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        if self.steps.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }
        Ok(Pipeline {
            steps: self.steps,
            stop_on_error: self.stop_on_error,
        })
    }
}

/// Ordered step chain with uniform failure containment.
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
    stop_on_error: bool,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder {
            steps: Vec::new(),
            stop_on_error: true,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Run the full step chain over one record.
    ///
    /// Steps whose precondition is false are recorded as skipped successes
    /// and leave the record alone. A step returning `Err` is contained
    /// here: it becomes a failed [`StepResult`] carrying the fault's
    /// message. With stop-on-error (the default) the chain halts at the
    /// first failure and the halting step is recorded.
    pub fn execute(&self, record: &mut WorkingRecord) -> PipelineResult {
        let started_at = Utc::now();
        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(self.steps.len());
        let mut halted_at = None;
        let mut first_failure: Option<String> = None;

        for step in &self.steps {
            let name = step.name().to_string();

            if !step.should_execute(record) {
                tracing::debug!(step = %name, tx = %record.transaction_id, "step skipped");
                outcomes.push(StepOutcome {
                    step: name,
                    result: StepResult::skipped("precondition not met"),
                });
                continue;
            }

            let result = match step.execute(record) {
                Ok(result) => result,
                Err(fault) => {
                    tracing::warn!(
                        step = %name,
                        tx = %record.transaction_id,
                        error = %fault,
                        "step fault contained"
                    );
                    StepResult::failure(fault.to_string())
                }
            };

            record.steps_applied.push(name.clone());
            let failed = !result.success;
            if failed && first_failure.is_none() {
                first_failure = Some(result.message.clone());
            }
            outcomes.push(StepOutcome { step: name.clone(), result });

            if failed && self.stop_on_error {
                halted_at = Some(name);
                break;
            }
        }

        let success = outcomes.iter().all(|o| o.result.success);
        if success {
            record.status = RecordStatus::Enriched;
            record.error = None;
        } else {
            record.status = RecordStatus::Failed;
            record.error = first_failure.clone();
        }

        PipelineResult {
            transaction_id: record.transaction_id.clone(),
            success,
            // The terminal error message belongs to the step that stopped
            // the chain; with stop-on-error off the per-step trail carries
            // the failures instead.
            error: if halted_at.is_some() { first_failure } else { None },
            halted_at,
            steps: outcomes,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepError;
    use augeo_core::{FieldValue, SourceType};

    struct TagStep {
        name: &'static str,
    }

    impl Step for TagStep {
        fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
            record.set_extra(self.name, FieldValue::Flag(true));
            Ok(StepResult::ok("tagged"))
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct FailingStep;

    impl Step for FailingStep {
        fn execute(&self, _record: &mut WorkingRecord) -> Result<StepResult, StepError> {
            Ok(StepResult::failure("business failure"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct FaultingStep;

    impl Step for FaultingStep {
        fn execute(&self, _record: &mut WorkingRecord) -> Result<StepResult, StepError> {
            Err(StepError::Internal("backend exploded".to_string()))
        }

        fn name(&self) -> &str {
            "faulting"
        }
    }

    struct SecuritiesOnlyStep;

    impl Step for SecuritiesOnlyStep {
        fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
            record.set_extra("securities_only", FieldValue::Flag(true));
            Ok(StepResult::ok("ran"))
        }

        fn should_execute(&self, record: &WorkingRecord) -> bool {
            record.source == SourceType::Securities
        }

        fn name(&self) -> &str {
            "securities_only"
        }
    }

    fn record() -> WorkingRecord {
        WorkingRecord::new("tx-1", "st-1", SourceType::Bank)
    }

    #[test]
    fn empty_pipeline_is_refused() {
        assert!(matches!(
            Pipeline::builder().build(),
            Err(PipelineError::EmptyPipeline)
        ));
    }

    #[test]
    fn steps_run_in_configured_order() {
        let pipeline = Pipeline::builder()
            .add_step(TagStep { name: "first" })
            .add_step(TagStep { name: "second" })
            .build()
            .unwrap();
        let mut rec = record();
        let result = pipeline.execute(&mut rec);

        assert!(result.success);
        assert_eq!(rec.steps_applied, vec!["first", "second"]);
        let names: Vec<_> = result.steps.iter().map(|o| o.step.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(rec.status, RecordStatus::Enriched);
    }

    #[test]
    fn stop_on_error_halts_the_chain() {
        let pipeline = Pipeline::builder()
            .add_step(FailingStep)
            .add_step(TagStep { name: "after" })
            .build()
            .unwrap();
        let mut rec = record();
        let result = pipeline.execute(&mut rec);

        assert!(!result.success);
        assert_eq!(result.halted_at.as_deref(), Some("failing"));
        assert_eq!(result.error.as_deref(), Some("business failure"));
        assert_eq!(result.steps.len(), 1);
        assert!(rec.extra("after").is_none());
        assert_eq!(rec.status, RecordStatus::Failed);
        assert_eq!(rec.error.as_deref(), Some("business failure"));
    }

    #[test]
    fn continue_on_error_runs_everything() {
        let pipeline = Pipeline::builder()
            .add_step(FailingStep)
            .add_step(TagStep { name: "after" })
            .stop_on_error(false)
            .build()
            .unwrap();
        let mut rec = record();
        let result = pipeline.execute(&mut rec);

        assert!(!result.success);
        assert!(result.halted_at.is_none());
        assert_eq!(result.steps.len(), 2);
        assert!(rec.extra("after").is_some());
    }

    #[test]
    fn step_fault_becomes_failed_result() {
        let pipeline = Pipeline::builder().add_step(FaultingStep).build().unwrap();
        let mut rec = record();
        let result = pipeline.execute(&mut rec);

        assert!(!result.success);
        let step = result.step("faulting").unwrap();
        assert!(!step.success);
        assert!(step.message.contains("backend exploded"));
    }

    #[test]
    fn skipped_step_leaves_record_untouched() {
        let pipeline = Pipeline::builder()
            .add_step(SecuritiesOnlyStep)
            .build()
            .unwrap();
        let mut rec = record();
        let before = rec.clone();
        let result = pipeline.execute(&mut rec);

        assert!(result.success);
        let step = result.step("securities_only").unwrap();
        assert!(step.success);
        assert!(step.skipped);
        assert_eq!(rec.extras, before.extras);
        assert!(rec.steps_applied.is_empty());
    }

    #[test]
    fn execute_twice_is_idempotent() {
        let pipeline = Pipeline::builder()
            .add_step(TagStep { name: "tag" })
            .build()
            .unwrap();
        let mut rec = record();
        let first = pipeline.execute(&mut rec);
        let extras_after_first = rec.extras.clone();
        let mut rec2 = rec.clone();
        rec2.steps_applied.clear();
        let second = pipeline.execute(&mut rec2);

        assert_eq!(first.success, second.success);
        assert_eq!(first.steps, second.steps);
        assert_eq!(rec2.extras, extras_after_first);
    }
}
