pub mod engine;
pub mod expr;
pub mod parser;

pub use engine::{
    Classification, ClassificationEngine, InMemoryRuleRepository, Rule, RuleError, RuleRepository,
    RuleScope,
};
pub use expr::{CmpOp, CompiledPattern, Expr, FieldSource, Predicate};
pub use parser::{parse, ParseError};
