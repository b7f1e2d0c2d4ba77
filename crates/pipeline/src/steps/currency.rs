use augeo_core::{FieldValue, StepResult, WorkingRecord};

use crate::lookup::CurrencyLookup;
use crate::step::{Step, StepError};

/// Validates the raw currency code against currency master data and
/// normalizes it to uppercase on the record.
pub struct ValidateCurrencyStep {
    currencies: Box<dyn CurrencyLookup>,
}

impl ValidateCurrencyStep {
    pub fn new(currencies: Box<dyn CurrencyLookup>) -> Self {
        ValidateCurrencyStep { currencies }
    }
}

impl Step for ValidateCurrencyStep {
    fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
        let Some(raw) = record.currency.as_deref().map(str::trim).filter(|c| !c.is_empty())
        else {
            return Ok(StepResult::failure("transaction carries no currency code"));
        };
        let code = raw.to_ascii_uppercase();

        match self.currencies.find(&code)? {
            Some(currency) => {
                record.currency = Some(currency.code.clone());
                Ok(StepResult::ok(format!("currency {} validated", currency.code))
                    .with_output("currency", FieldValue::Text(currency.code)))
            }
            None => Ok(StepResult::failure(format!("unknown currency '{code}'"))),
        }
    }

    fn name(&self) -> &str {
        "validate_currency"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{Currency, LookupError};
    use augeo_core::SourceType;

    struct FixedCurrencies;

    impl CurrencyLookup for FixedCurrencies {
        fn find(&self, code: &str) -> Result<Option<Currency>, LookupError> {
            match code {
                "EUR" | "USD" => Ok(Some(Currency {
                    code: code.to_string(),
                    name: code.to_string(),
                    minor_units: 2,
                })),
                _ => Ok(None),
            }
        }
    }

    struct BrokenCurrencies;

    impl CurrencyLookup for BrokenCurrencies {
        fn find(&self, _code: &str) -> Result<Option<Currency>, LookupError> {
            Err(LookupError::Backend("master data offline".to_string()))
        }
    }

    fn record(currency: Option<&str>) -> WorkingRecord {
        let mut r = WorkingRecord::new("tx-1", "st-1", SourceType::Bank);
        r.currency = currency.map(str::to_string);
        r
    }

    #[test]
    fn known_currency_is_normalized() {
        let step = ValidateCurrencyStep::new(Box::new(FixedCurrencies));
        let mut rec = record(Some("eur"));
        let result = step.execute(&mut rec).unwrap();
        assert!(result.success);
        assert_eq!(rec.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn unknown_currency_fails() {
        let step = ValidateCurrencyStep::new(Box::new(FixedCurrencies));
        let mut rec = record(Some("XXX"));
        let result = step.execute(&mut rec).unwrap();
        assert!(!result.success);
        assert!(result.message.contains("XXX"));
    }

    #[test]
    fn missing_currency_fails() {
        let step = ValidateCurrencyStep::new(Box::new(FixedCurrencies));
        let result = step.execute(&mut record(None)).unwrap();
        assert!(!result.success);
    }

    #[test]
    fn backend_fault_propagates_as_step_error() {
        let step = ValidateCurrencyStep::new(Box::new(BrokenCurrencies));
        let err = step.execute(&mut record(Some("EUR"))).unwrap_err();
        assert!(matches!(err, StepError::Lookup(_)));
    }
}
