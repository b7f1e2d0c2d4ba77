use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("base_currency must be a three-letter ISO code, got '{0}'")]
    BadBaseCurrency(String),
    #[error("review_confidence_floor must be within 0..=100, got {0}")]
    BadConfidenceFloor(f32),
}

/// Names of the row-store collections the coordinator writes to.
///
/// Injected rather than hard-coded so two engines can share one store
/// without colliding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Collections {
    pub statements: String,
    pub transactions: String,
    pub enrichments: String,
}

impl Default for Collections {
    fn default() -> Self {
        Collections {
            statements: "statements".to_string(),
            transactions: "transactions".to_string(),
            enrichments: "enrichment_records".to_string(),
        }
    }
}

/// Process-wide engine configuration, handed to the pipeline and the state
/// coordinator at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency every transaction amount is converted into.
    pub base_currency: String,
    /// Halt a record's step chain at the first failing step.
    pub stop_on_error: bool,
    /// Customer-identification confidence (0–100) below which an otherwise
    /// clean record is routed to manual review.
    pub review_confidence_floor: f32,
    pub collections: Collections,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_currency: "EUR".to_string(),
            stop_on_error: true,
            review_confidence_floor: 80.0,
            collections: Collections::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_currency.len() != 3
            || !self.base_currency.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(ConfigError::BadBaseCurrency(self.base_currency.clone()));
        }
        if !(0.0..=100.0).contains(&self.review_confidence_floor) {
            return Err(ConfigError::BadConfidenceFloor(self.review_confidence_floor));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let c = EngineConfig::default();
        assert_eq!(c.base_currency, "EUR");
        assert!(c.stop_on_error);
        assert_eq!(c.review_confidence_floor, 80.0);
        assert_eq!(c.collections.enrichments, "enrichment_records");
    }

    #[test]
    fn from_toml_overrides_defaults() {
        let c = EngineConfig::from_toml(
            r#"
            base_currency = "USD"
            stop_on_error = false

            [collections]
            enrichments = "enriched"
            "#,
        )
        .unwrap();
        assert_eq!(c.base_currency, "USD");
        assert!(!c.stop_on_error);
        assert_eq!(c.collections.enrichments, "enriched");
        assert_eq!(c.collections.statements, "statements");
    }

    #[test]
    fn rejects_bad_base_currency() {
        let err = EngineConfig::from_toml("base_currency = \"eur\"").unwrap_err();
        assert!(matches!(err, ConfigError::BadBaseCurrency(_)));
    }

    #[test]
    fn rejects_out_of_range_floor() {
        let err = EngineConfig::from_toml("review_confidence_floor = 120.0").unwrap_err();
        assert!(matches!(err, ConfigError::BadConfidenceFloor(_)));
    }
}
