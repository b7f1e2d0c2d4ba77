use rust_decimal::Decimal;

use augeo_core::{FieldValue, StepResult, WorkingRecord};

use crate::lookup::FxRateLookup;
use crate::step::{Step, StepError};
use crate::steps::keys;

/// Derives the base-currency amount from the raw amount via the FX rate
/// table. Same-currency records convert at 1 without consulting the table.
pub struct ConvertAmountStep {
    rates: Box<dyn FxRateLookup>,
    base_currency: String,
}

impl ConvertAmountStep {
    pub fn new(rates: Box<dyn FxRateLookup>, base_currency: &str) -> Self {
        ConvertAmountStep {
            rates,
            base_currency: base_currency.to_string(),
        }
    }
}

impl Step for ConvertAmountStep {
    fn execute(&self, record: &mut WorkingRecord) -> Result<StepResult, StepError> {
        let Some(currency) = record.currency.clone() else {
            return Ok(StepResult::failure("no validated currency on record"));
        };
        let Some(amount) = record.amount else {
            return Ok(StepResult::failure("transaction carries no amount"));
        };

        if currency == self.base_currency {
            record.base_amount = Some(amount);
            record.set_extra(keys::FX_RATE, FieldValue::Number(Decimal::ONE));
            return Ok(StepResult::ok("amount already in base currency")
                .with_output(keys::FX_RATE, FieldValue::Number(Decimal::ONE)));
        }

        let Some(on) = record.booking_date else {
            return Ok(StepResult::failure(
                "no booking date to price the conversion",
            ));
        };

        match self.rates.rate(&currency, &self.base_currency, on)? {
            Some(rate) => {
                record.base_amount = Some(amount * rate);
                record.set_extra(keys::FX_RATE, FieldValue::Number(rate));
                Ok(StepResult::ok(format!(
                    "converted {currency} to {} at {rate}",
                    self.base_currency
                ))
                .with_output(keys::FX_RATE, FieldValue::Number(rate)))
            }
            None => Ok(StepResult::failure(format!(
                "no {currency}/{} rate for {on}",
                self.base_currency
            ))),
        }
    }

    fn name(&self) -> &str {
        "convert_amount"
    }
}
