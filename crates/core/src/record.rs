use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::RecordStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Bank,
    Securities,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Bank => write!(f, "bank"),
            SourceType::Securities => write!(f, "securities"),
        }
    }
}

/// A value in the side-table and the uniform shape field access returns.
///
/// Steps communicate through named fields where one exists and through
/// side-table entries otherwise; keeping the entries tagged means a step
/// reading a number a previous step wrote gets a number, not a string to
/// re-parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(Decimal),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string form predicates compare against.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.normalize().to_string(),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric view for the `>` / `<` family; `None` when the value has no
    /// decimal reading.
    pub fn numeric(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Decimal> for FieldValue {
    fn from(n: Decimal) -> Self {
        FieldValue::Number(n)
    }
}

/// The mutable per-transaction context one pipeline run reads and writes.
///
/// Exactly one working record exists per source transaction per run. Raw
/// fields come from the loader; derived fields are filled in by steps; the
/// `extras` side-table carries step-to-step values that never earned a
/// named field. A side-table key is a contract string between steps, and a
/// step may only read keys written by steps configured before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingRecord {
    pub transaction_id: String,
    pub statement_id: String,
    pub source: SourceType,

    // Raw extracted fields.
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub booking_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub counterparty_account: Option<String>,
    pub counterparty_bic: Option<String>,
    /// Free-text counterparty as it appeared on the statement line.
    pub counterparty_text: Option<String>,
    /// Securities lines only.
    pub isin: Option<String>,
    pub trade_type: Option<String>,

    // Derived fields.
    pub base_amount: Option<Decimal>,
    pub counterparty_id: Option<String>,
    pub counterparty_name: Option<String>,
    pub customer_id: Option<String>,
    /// 0–100 scale.
    pub customer_confidence: Option<f32>,
    pub internal_type: Option<String>,

    pub extras: BTreeMap<String, FieldValue>,
    pub status: RecordStatus,
    pub error: Option<String>,
    pub steps_applied: Vec<String>,
}

impl WorkingRecord {
    pub fn new(transaction_id: &str, statement_id: &str, source: SourceType) -> Self {
        WorkingRecord {
            transaction_id: transaction_id.to_string(),
            statement_id: statement_id.to_string(),
            source,
            currency: None,
            amount: None,
            booking_date: None,
            value_date: None,
            description: None,
            counterparty_account: None,
            counterparty_bic: None,
            counterparty_text: None,
            isin: None,
            trade_type: None,
            base_amount: None,
            counterparty_id: None,
            counterparty_name: None,
            customer_id: None,
            customer_confidence: None,
            internal_type: None,
            extras: BTreeMap::new(),
            status: RecordStatus::Pending,
            error: None,
            steps_applied: Vec::new(),
        }
    }

    pub fn set_extra(&mut self, key: &str, value: FieldValue) {
        self.extras.insert(key.to_string(), value);
    }

    pub fn extra(&self, key: &str) -> Option<&FieldValue> {
        self.extras.get(key)
    }

    /// Uniform field access: named fields first, then the side-table.
    ///
    /// This is the surface rule conditions evaluate against, so every name
    /// used here is part of the rule-authoring vocabulary.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.as_ref().map(|s| FieldValue::Text(s.clone()));
        let number = |v: &Option<Decimal>| v.map(FieldValue::Number);
        let date = |v: &Option<NaiveDate>| v.map(FieldValue::Date);

        match name {
            "transaction_id" => Some(FieldValue::Text(self.transaction_id.clone())),
            "statement_id" => Some(FieldValue::Text(self.statement_id.clone())),
            "source" => Some(FieldValue::Text(self.source.to_string())),
            "currency" => text(&self.currency),
            "amount" => number(&self.amount),
            "booking_date" => date(&self.booking_date),
            "value_date" => date(&self.value_date),
            "description" => text(&self.description),
            "counterparty_account" => text(&self.counterparty_account),
            "counterparty_bic" => text(&self.counterparty_bic),
            "counterparty_text" => text(&self.counterparty_text),
            "isin" => text(&self.isin),
            "trade_type" => text(&self.trade_type),
            "base_amount" => number(&self.base_amount),
            "counterparty_id" => text(&self.counterparty_id),
            "counterparty_name" => text(&self.counterparty_name),
            "customer_id" => text(&self.customer_id),
            "customer_confidence" => self
                .customer_confidence
                .and_then(Decimal::from_f32)
                .map(FieldValue::Number),
            "internal_type" => text(&self.internal_type),
            other => self.extras.get(other).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WorkingRecord {
        let mut r = WorkingRecord::new("tx-1", "st-1", SourceType::Bank);
        r.currency = Some("EUR".to_string());
        r.amount = Some(Decimal::new(50000, 2));
        r.description = Some("INVOICE 4711".to_string());
        r
    }

    #[test]
    fn field_resolves_named_fields() {
        let r = record();
        assert_eq!(r.field("currency"), Some(FieldValue::Text("EUR".into())));
        assert_eq!(
            r.field("amount"),
            Some(FieldValue::Number(Decimal::new(50000, 2)))
        );
        assert_eq!(r.field("source"), Some(FieldValue::Text("bank".into())));
    }

    #[test]
    fn field_falls_back_to_side_table() {
        let mut r = record();
        r.set_extra("fx_rate", FieldValue::Number(Decimal::ONE));
        assert_eq!(r.field("fx_rate"), Some(FieldValue::Number(Decimal::ONE)));
    }

    #[test]
    fn missing_field_is_none() {
        assert_eq!(record().field("no_such_field"), None);
        assert_eq!(record().field("customer_id"), None);
    }

    #[test]
    fn render_normalizes_numbers() {
        assert_eq!(FieldValue::Number(Decimal::new(50000, 2)).render(), "500");
        assert_eq!(FieldValue::Number(Decimal::new(50050, 2)).render(), "500.5");
    }

    #[test]
    fn numeric_parses_text() {
        assert_eq!(
            FieldValue::Text("42.5".into()).numeric(),
            Some(Decimal::new(425, 1))
        );
        assert_eq!(FieldValue::Text("n/a".into()).numeric(), None);
    }

    #[test]
    fn confidence_surfaces_as_number() {
        let mut r = record();
        r.customer_confidence = Some(95.0);
        let v = r.field("customer_confidence").unwrap();
        assert_eq!(v.numeric(), Some(Decimal::from(95)));
    }
}
