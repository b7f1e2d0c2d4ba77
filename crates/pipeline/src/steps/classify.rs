use rust_decimal::Decimal;

use augeo_core::status::{UNKNOWN, UNMATCHED};
use augeo_core::{FieldValue, StepResult, WorkingRecord};
use augeo_rules::{Classification, ClassificationEngine};

use crate::step::{Step, StepError};
use crate::steps::keys;

/// Assigns the internal classification code by first-match-wins rule
/// evaluation. No match is a manual-review outcome (`UNMATCHED`), not a
/// failure. Runs after counterparty resolution so counterparty-scoped
/// rules see a resolved id; an `UNKNOWN` counterparty naturally reaches
/// only wildcard rules.
pub struct ClassifyStep {
    engine: ClassificationEngine,
}

impl ClassifyStep {
    pub fn new(engine: ClassificationEngine) -> Self {
        ClassifyStep { engine }
    }
}

impl Step for ClassifyStep {
    fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
        let counterparty = record
            .counterparty_id
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string());

        match self.engine.classify(record.source, &counterparty, &*record) {
            Classification::Matched {
                code,
                rule_id,
                rule_name,
                priority,
            } => {
                record.internal_type = Some(code.clone());
                record.set_extra(keys::RULE_ID, FieldValue::Text(rule_id.clone()));
                record.set_extra(keys::RULE_NAME, FieldValue::Text(rule_name.clone()));
                record.set_extra(
                    keys::RULE_PRIORITY,
                    FieldValue::Number(Decimal::from(priority)),
                );
                Ok(StepResult::ok(format!("classified as {code} by rule {rule_id}"))
                    .with_output(keys::RULE_ID, FieldValue::Text(rule_id))
                    .with_output("internal_type", FieldValue::Text(code)))
            }
            Classification::Unmatched => {
                record.internal_type = Some(UNMATCHED.to_string());
                Ok(StepResult::ok("no rule matched, flagged UNMATCHED")
                    .with_output("internal_type", FieldValue::Text(UNMATCHED.to_string())))
            }
        }
    }

    fn name(&self) -> &str {
        "classify"
    }
}
