pub mod lookup;
pub mod pipeline;
pub mod runner;
pub mod step;
pub mod steps;

pub use lookup::{
    Counterparty, CounterpartyLookup, Currency, CurrencyLookup, CustomerLookup, CustomerMatch,
    FxRateLookup, LookupError,
};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError};
pub use runner::BatchRunner;
pub use step::{Step, StepError};
pub use steps::{
    ClassifyStep, ConvertAmountStep, IdentifyCustomerStep, ResolveCounterpartyStep,
    ValidateCurrencyStep,
};
