use serde::{Deserialize, Serialize};
use thiserror::Error;

use augeo_core::record::SourceType;
use augeo_core::status::UNMATCHED;

use crate::expr::{Expr, FieldSource};
use crate::parser::{self, ParseError};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule '{rule_id}' has a bad condition: {source}")]
    BadCondition {
        rule_id: String,
        #[source]
        source: ParseError,
    },
    #[error("Failed to parse rules TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Rule repository error: {0}")]
    Repository(String),
}

/// Counterparty scope of a rule. Serialized as the counterparty id, with
/// `"*"` (or absence) meaning the universal scope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RuleScope {
    #[default]
    Wildcard,
    Counterparty(String),
}

impl From<String> for RuleScope {
    fn from(s: String) -> Self {
        if s.is_empty() || s == "*" {
            RuleScope::Wildcard
        } else {
            RuleScope::Counterparty(s)
        }
    }
}

impl From<RuleScope> for String {
    fn from(scope: RuleScope) -> Self {
        match scope {
            RuleScope::Wildcard => "*".to_string(),
            RuleScope::Counterparty(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub source: SourceType,
    #[serde(default)]
    pub counterparty: RuleScope,
    #[serde(default = "active_default")]
    pub active: bool,
    /// Ascending: lower numbers are considered first within a scope group.
    pub priority: i32,
    pub condition: String,
    /// Classification code assigned when the condition holds.
    pub internal_type: String,
}

fn active_default() -> bool {
    true
}

/// Where the engine gets its rule set from.
pub trait RuleRepository {
    /// Active rules for one source feed, in stable id order.
    fn active_rules(&self, source: SourceType) -> Result<Vec<Rule>, RuleError>;
}

pub struct InMemoryRuleRepository {
    rules: Vec<Rule>,
}

impl InMemoryRuleRepository {
    pub fn new(rules: Vec<Rule>) -> Self {
        InMemoryRuleRepository { rules }
    }
}

impl RuleRepository for InMemoryRuleRepository {
    fn active_rules(&self, source: SourceType) -> Result<Vec<Rule>, RuleError> {
        let mut rules: Vec<Rule> = self
            .rules
            .iter()
            .filter(|r| r.active && r.source == source)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rules)
    }
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Matched {
        code: String,
        rule_id: String,
        rule_name: String,
        priority: i32,
    },
    Unmatched,
}

impl Classification {
    pub fn code(&self) -> &str {
        match self {
            Classification::Matched { code, .. } => code,
            Classification::Unmatched => UNMATCHED,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, Classification::Unmatched)
    }
}

/// Internal pairing of a rule with its compiled condition.
#[derive(Debug)]
struct CompiledRule {
    rule: Rule,
    condition: Expr,
}

/// Classifies records against a prioritized, scoped rule set.
///
/// Conditions are compiled once at construction; a rule that fails to
/// compile makes construction fail loudly rather than silently dropping
/// the rule. Candidate order per lookup is counterparty-specific rules
/// before wildcard rules, ascending `(priority, id)` inside each group,
/// and the first condition that holds wins.
#[derive(Debug)]
pub struct ClassificationEngine {
    rules: Vec<CompiledRule>,
}

impl ClassificationEngine {
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if !rule.active {
                continue;
            }
            let condition = parser::parse(&rule.condition).map_err(|source| {
                RuleError::BadCondition {
                    rule_id: rule.id.clone(),
                    source,
                }
            })?;
            compiled.push(CompiledRule { rule, condition });
        }
        // One stable sort up front; lookups then only partition by scope.
        compiled.sort_by(|a, b| {
            (a.rule.priority, a.rule.id.as_str()).cmp(&(b.rule.priority, b.rule.id.as_str()))
        });
        tracing::debug!(rules = compiled.len(), "classification engine ready");
        Ok(ClassificationEngine { rules: compiled })
    }

    /// Load rules from `[[rule]]` tables in a TOML document.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        #[derive(Deserialize)]
        struct RuleFile {
            #[serde(default)]
            rule: Vec<Rule>,
        }
        let file: RuleFile = toml::from_str(toml_content)?;
        Self::new(file.rule)
    }

    pub fn from_repository(
        repository: &dyn RuleRepository,
        source: SourceType,
    ) -> Result<Self, RuleError> {
        Self::new(repository.active_rules(source)?)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// First-match-wins classification for the record's (source,
    /// counterparty) scope. Counterparty specificity outranks priority:
    /// every counterparty-scoped candidate is tried before any wildcard one.
    pub fn classify(
        &self,
        source: SourceType,
        counterparty: &str,
        fields: &dyn FieldSource,
    ) -> Classification {
        let specific = self.rules.iter().filter(|cr| {
            cr.rule.source == source
                && matches!(&cr.rule.counterparty, RuleScope::Counterparty(id) if id == counterparty)
        });
        let wildcard = self
            .rules
            .iter()
            .filter(|cr| cr.rule.source == source && cr.rule.counterparty == RuleScope::Wildcard);

        for cr in specific.chain(wildcard) {
            if cr.condition.eval(fields) {
                tracing::debug!(
                    rule = %cr.rule.id,
                    code = %cr.rule.internal_type,
                    "rule matched"
                );
                return Classification::Matched {
                    code: cr.rule.internal_type.clone(),
                    rule_id: cr.rule.id.clone(),
                    rule_name: cr.rule.name.clone(),
                    priority: cr.rule.priority,
                };
            }
        }
        Classification::Unmatched
    }
}
