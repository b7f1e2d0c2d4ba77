mod classify;
mod convert_amount;
mod counterparty;
mod customer;
mod currency;

pub use classify::ClassifyStep;
pub use convert_amount::ConvertAmountStep;
pub use counterparty::ResolveCounterpartyStep;
pub use currency::ValidateCurrencyStep;
pub use customer::IdentifyCustomerStep;

/// Side-table keys steps agree on. A key may only be read by steps
/// configured after the step that writes it.
pub mod keys {
    /// Written by `convert_amount`: the rate applied to reach base currency.
    pub const FX_RATE: &str = "fx_rate";
    /// Written by `classify`: audit trail of the winning rule.
    pub const RULE_ID: &str = "rule_id";
    pub const RULE_NAME: &str = "rule_name";
    pub const RULE_PRIORITY: &str = "rule_priority";
}
