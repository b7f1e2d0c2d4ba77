use augeo_core::status::UNKNOWN;
use augeo_core::{FieldValue, SourceType, StepResult, WorkingRecord};

use crate::lookup::CustomerLookup;
use crate::step::{Step, StepError};

/// Identifies the customer behind a bank transaction from its free-text
/// fields. Securities records carry the customer on the safekeeping
/// account and skip this step entirely.
pub struct IdentifyCustomerStep {
    customers: Box<dyn CustomerLookup>,
}

impl IdentifyCustomerStep {
    pub fn new(customers: Box<dyn CustomerLookup>) -> Self {
        IdentifyCustomerStep { customers }
    }
}

impl Step for IdentifyCustomerStep {
    fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
        match self.customers.identify(record)? {
            Some(customer) => {
                record.customer_id = Some(customer.id.clone());
                record.customer_confidence = Some(customer.confidence);
                Ok(StepResult::ok(format!(
                    "customer {} identified at {:.0}%",
                    customer.id, customer.confidence
                ))
                .with_output("customer_id", FieldValue::Text(customer.id)))
            }
            None => {
                record.customer_id = Some(UNKNOWN.to_string());
                record.customer_confidence = None;
                Ok(StepResult::ok("no customer identified, flagged UNKNOWN")
                    .with_output("customer_id", FieldValue::Text(UNKNOWN.to_string())))
            }
        }
    }

    fn should_execute(&self, record: &WorkingRecord) -> bool {
        record.source == SourceType::Bank
    }

    fn name(&self) -> &str {
        "identify_customer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{CustomerMatch, LookupError};

    struct NameMatcher;

    impl CustomerLookup for NameMatcher {
        fn identify(&self, record: &WorkingRecord) -> Result<Option<CustomerMatch>, LookupError> {
            match record.description.as_deref() {
                Some(d) if d.contains("ACME") => Ok(Some(CustomerMatch {
                    id: "CUST-7".to_string(),
                    confidence: 95.0,
                })),
                _ => Ok(None),
            }
        }
    }

    fn bank_record(description: &str) -> WorkingRecord {
        let mut r = WorkingRecord::new("tx-1", "st-1", SourceType::Bank);
        r.description = Some(description.to_string());
        r
    }

    #[test]
    fn identifies_customer_with_confidence() {
        let step = IdentifyCustomerStep::new(Box::new(NameMatcher));
        let mut rec = bank_record("INVOICE ACME GMBH");
        let result = step.execute(&mut rec).unwrap();
        assert!(result.success);
        assert_eq!(rec.customer_id.as_deref(), Some("CUST-7"));
        assert_eq!(rec.customer_confidence, Some(95.0));
    }

    #[test]
    fn no_hit_flags_unknown() {
        let step = IdentifyCustomerStep::new(Box::new(NameMatcher));
        let mut rec = bank_record("SOMETHING ELSE");
        let result = step.execute(&mut rec).unwrap();
        assert!(result.success);
        assert_eq!(rec.customer_id.as_deref(), Some(UNKNOWN));
        assert!(rec.customer_confidence.is_none());
    }

    #[test]
    fn securities_records_are_skipped() {
        let step = IdentifyCustomerStep::new(Box::new(NameMatcher));
        let rec = WorkingRecord::new("tx-1", "st-1", SourceType::Securities);
        assert!(!step.should_execute(&rec));
    }
}
