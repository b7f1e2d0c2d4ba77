use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use augeo_core::WorkingRecord;

/// Infrastructure fault inside a lookup backend.
///
/// Not-found is never an error: lookups return `Ok(None)` for a clean miss
/// and reserve `Err` for the backend itself failing.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    /// ISO 4217 code, uppercase.
    pub code: String,
    pub name: String,
    pub minor_units: u32,
}

pub trait CurrencyLookup {
    fn find(&self, code: &str) -> Result<Option<Currency>, LookupError>;
}

pub trait FxRateLookup {
    /// Conversion rate from one currency into another as of a date:
    /// `amount_in_to = amount_in_from * rate`.
    fn rate(&self, from: &str, to: &str, on: NaiveDate) -> Result<Option<Decimal>, LookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterparty {
    pub id: String,
    pub bic: Option<String>,
    pub name: String,
}

pub trait CounterpartyLookup {
    fn by_bic(&self, bic: &str) -> Result<Option<Counterparty>, LookupError>;
    fn by_account(&self, account: &str) -> Result<Option<Counterparty>, LookupError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerMatch {
    pub id: String,
    /// 0–100; how sure the heuristics are that this is the right customer.
    pub confidence: f32,
}

/// Customer identification over the record's free-text fields.
///
/// The matching heuristics (name extraction, registration numbers) are
/// business-specific and live behind this seam.
pub trait CustomerLookup {
    fn identify(&self, record: &WorkingRecord) -> Result<Option<CustomerMatch>, LookupError>;
}
