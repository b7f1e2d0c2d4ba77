use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::Decimal;

use augeo_core::{FieldValue, WorkingRecord};

/// Anything a condition can be evaluated against.
///
/// [`WorkingRecord`] is the production implementation; a plain map works
/// for tests and ad-hoc evaluation.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl FieldSource for WorkingRecord {
    fn field(&self, name: &str) -> Option<FieldValue> {
        WorkingRecord::field(self, name)
    }
}

impl FieldSource for BTreeMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

/// A regex predicate's pattern, compiled once at parse time.
///
/// The `regex` operator is a full-string match, so the user-supplied
/// pattern is anchored as `^(?:pat)$`; the non-capturing group keeps
/// alternations inside the pattern anchored as a whole.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub raw: String,
    regex: Regex,
}

impl CompiledPattern {
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{raw})$"))?;
        Ok(CompiledPattern {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmpOp {
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Regex(CompiledPattern),
    In(Vec<String>),
    Gt(Decimal),
    Lt(Decimal),
    Ge(Decimal),
    Le(Decimal),
}

/// One atomic `field op value` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: CmpOp,
}

impl Predicate {
    /// A predicate over a missing field is false, never a fault; likewise a
    /// numeric comparison over a field with no decimal reading.
    pub fn eval(&self, fields: &dyn FieldSource) -> bool {
        let Some(value) = fields.field(&self.field) else {
            return false;
        };
        match &self.op {
            CmpOp::Equals(want) => value.render() == *want,
            CmpOp::Contains(want) => value.render().contains(want.as_str()),
            CmpOp::StartsWith(want) => value.render().starts_with(want.as_str()),
            CmpOp::EndsWith(want) => value.render().ends_with(want.as_str()),
            CmpOp::Regex(pattern) => pattern.matches(&value.render()),
            CmpOp::In(items) => {
                let rendered = value.render();
                items.iter().any(|item| *item == rendered)
            }
            CmpOp::Gt(n) => value.numeric().is_some_and(|v| v > *n),
            CmpOp::Lt(n) => value.numeric().is_some_and(|v| v < *n),
            CmpOp::Ge(n) => value.numeric().is_some_and(|v| v >= *n),
            CmpOp::Le(n) => value.numeric().is_some_and(|v| v <= *n),
        }
    }
}

/// A compiled condition: comparisons combined with `AND` / `OR`.
///
/// `AND` binds tighter than `OR`; parentheses in the source text shape the
/// tree and need no node of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison(Predicate),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn eval(&self, fields: &dyn FieldSource) -> bool {
        match self {
            Expr::Comparison(p) => p.eval(fields),
            Expr::And(parts) => parts.iter().all(|p| p.eval(fields)),
            Expr::Or(parts) => parts.iter().any(|p| p.eval(fields)),
        }
    }
}
