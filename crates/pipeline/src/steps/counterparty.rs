use augeo_core::status::UNKNOWN;
use augeo_core::{FieldValue, StepResult, WorkingRecord};

use crate::lookup::CounterpartyLookup;
use crate::step::{Step, StepError};

/// Resolves the counterparty master record, BIC first, then account
/// number. A record with no master hit gets the `UNKNOWN` sentinel and is
/// left to the manual-review gate downstream; an unrecognized counterparty
/// is a review case, not a failure.
pub struct ResolveCounterpartyStep {
    counterparties: Box<dyn CounterpartyLookup>,
}

impl ResolveCounterpartyStep {
    pub fn new(counterparties: Box<dyn CounterpartyLookup>) -> Self {
        ResolveCounterpartyStep { counterparties }
    }
}

impl Step for ResolveCounterpartyStep {
    fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
        let mut found = None;
        if let Some(bic) = record.counterparty_bic.as_deref() {
            found = self.counterparties.by_bic(bic)?;
        }
        if found.is_none() {
            if let Some(account) = record.counterparty_account.as_deref() {
                found = self.counterparties.by_account(account)?;
            }
        }

        match found {
            Some(cpt) => {
                record.counterparty_id = Some(cpt.id.clone());
                record.counterparty_name = Some(cpt.name.clone());
                if record.counterparty_bic.is_none() {
                    record.counterparty_bic = cpt.bic.clone();
                }
                Ok(StepResult::ok(format!("counterparty {} resolved", cpt.id))
                    .with_output("counterparty_id", FieldValue::Text(cpt.id)))
            }
            None => {
                record.counterparty_id = Some(UNKNOWN.to_string());
                Ok(StepResult::ok("no counterparty master record, flagged UNKNOWN")
                    .with_output("counterparty_id", FieldValue::Text(UNKNOWN.to_string())))
            }
        }
    }

    fn name(&self) -> &str {
        "resolve_counterparty"
    }
}
