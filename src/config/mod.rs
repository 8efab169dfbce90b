//! Layered configuration for crosswalk runs.
//!
//! Configuration is loaded with precedence: Env vars > Config file > Defaults
//!
//! # Example config file (crosswalk.toml)
//! ```toml
//! [scoring]
//! preferred_exchanges = ["NYSE", "NASDAQ"]
//!
//! [scoring.weights]
//! tier_step = 100.0
//! overlap = 20.0
//!
//! [matching]
//! parallel = true
//! aggregation = "overlap-weighted"
//!
//! [dedup]
//! policy = "keep-last"
//!
//! [[providers]]
//! name = "msci"
//! kind = "msci"
//! ```

mod defaults;

pub use defaults::*;

use crate::aggregate::AggregationMode;
use crate::dedup::DuplicatePolicy;
use crate::error::{CrosswalkError, Result};
use crate::provider::ProviderKind;
use crate::score::{QualityScorer, ScoreWeights};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a crosswalk run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosswalkConfig {
    pub scoring: ScoringConfig,
    pub matching: MatchingConfig,
    pub dedup: DedupConfig,
    /// Registered providers, processed in this order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            matching: MatchingConfig::default(),
            dedup: DedupConfig::default(),
            providers: vec![
                ProviderConfig::new("refinitiv", ProviderKind::Refinitiv),
                ProviderConfig::new("msci", ProviderKind::Msci),
                ProviderConfig::new("fmp", ProviderKind::Fmp),
            ],
        }
    }
}

impl CrosswalkConfig {
    /// Load configuration with precedence: Env > File > Defaults, then validate it.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(CrosswalkConfig::default()));

        // Layer 1: Config file (if provided)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 2: Environment variables with CROSSWALK_ prefix
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check weight dominance and provider registry consistency.
    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(CrosswalkError::Config("provider name is empty".to_string()));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(CrosswalkError::Config(format!(
                    "provider {:?} registered twice",
                    provider.name
                )));
            }
        }
        Ok(())
    }

    /// Registry entry for `name`.
    pub fn provider(&self, name: &str) -> Result<&ProviderConfig> {
        self.providers
            .iter()
            .find(|provider| provider.name == name)
            .ok_or_else(|| CrosswalkError::UnknownProvider(name.to_string()))
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|provider| provider.enabled)
    }

    pub fn scorer(&self) -> Result<QualityScorer> {
        QualityScorer::new(self.scoring.weights, &self.scoring.preferred_exchanges)
    }
}

/// Quality score configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Exchange labels or numeric codes that earn the listing bonus
    pub preferred_exchanges: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            preferred_exchanges: default_preferred_exchanges(),
        }
    }
}

/// Matching execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Match records on the rayon pool
    pub parallel: bool,
    /// Smallest panel worth distributing across threads
    pub parallel_min_records: usize,
    /// How per-period scores roll up into an entity key total
    pub aggregation: AggregationMode,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL,
            parallel_min_records: DEFAULT_PARALLEL_MIN_RECORDS,
            aggregation: AggregationMode::default(),
        }
    }
}

/// Duplicate entity-period handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub policy: DuplicatePolicy,
}

/// One provider registry entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrosswalkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.weights.tier_step, DEFAULT_TIER_WEIGHT);
        assert_eq!(config.dedup.policy, DuplicatePolicy::Reject);
        assert_eq!(config.matching.aggregation, AggregationMode::Sum);
        assert_eq!(config.enabled_providers().count(), 3);
    }

    #[test]
    fn test_provider_lookup() {
        let config = CrosswalkConfig::default();
        assert_eq!(config.provider("fmp").unwrap().kind, ProviderKind::Fmp);
        assert!(matches!(
            config.provider("sustainalytics"),
            Err(CrosswalkError::UnknownProvider(name)) if name == "sustainalytics"
        ));
    }

    #[test]
    fn test_duplicate_provider_rejected() {
        let mut config = CrosswalkConfig::default();
        config
            .providers
            .push(ProviderConfig::new("msci", ProviderKind::Custom));
        assert!(matches!(config.validate(), Err(CrosswalkError::Config(_))));
    }

    #[test]
    fn test_weights_validated() {
        let mut config = CrosswalkConfig::default();
        config.scoring.weights.common = 90.0;
        assert!(matches!(
            config.validate(),
            Err(CrosswalkError::InvalidWeights { .. })
        ));
        assert!(config.scorer().is_err());
    }

    #[test]
    fn test_enum_serde() {
        let json = serde_json::to_string(&AggregationMode::OverlapWeighted).unwrap();
        assert_eq!(json, "\"overlap-weighted\"");

        let policy: DuplicatePolicy = serde_json::from_str("\"keep-first\"").unwrap();
        assert_eq!(policy, DuplicatePolicy::KeepFirst);
    }
}
