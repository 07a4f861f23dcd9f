use crate::catalog::CatalogError;
use crate::strategy::StrategyId;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const CORPUS_MUTATION_RADAMSA_PROBABILITY: f64 = 0.15;
pub const RANDOM_MAX_LENGTH_PROBABILITY: f64 = 0.25;
pub const CORPUS_MUTATION_ML_RNN_PROBABILITY: f64 = 0.50;
pub const VALUE_PROFILE_PROBABILITY: f64 = 0.33;
pub const FORK_PROBABILITY: f64 = 0.50;
pub const CORPUS_SUBSET_PROBABILITY: f64 = 0.50;
pub const RECOMMENDED_DICTIONARY_PROBABILITY: f64 = 0.10;
/// Overlay probability for the mutator plugin. Tunable through the
/// `[overlays]` configuration table.
pub const MUTATOR_PLUGIN_PROBABILITY: f64 = 0.50;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbabilityError {
    #[error("Probability {value} for strategy '{strategy}' is outside [0, 1]")]
    OutOfRange { strategy: StrategyId, value: f64 },
}

/// Built-in trial probability for a strategy.
pub fn default_probability(id: StrategyId) -> f64 {
    match id {
        StrategyId::CorpusMutationRadamsa => CORPUS_MUTATION_RADAMSA_PROBABILITY,
        StrategyId::RandomMaxLength => RANDOM_MAX_LENGTH_PROBABILITY,
        StrategyId::CorpusMutationMlRnn => CORPUS_MUTATION_ML_RNN_PROBABILITY,
        StrategyId::ValueProfile => VALUE_PROFILE_PROBABILITY,
        StrategyId::Fork => FORK_PROBABILITY,
        StrategyId::CorpusSubset => CORPUS_SUBSET_PROBABILITY,
        StrategyId::RecommendedDictionary => RECOMMENDED_DICTIONARY_PROBABILITY,
        StrategyId::MutatorPlugin => MUTATOR_PLUGIN_PROBABILITY,
    }
}

/// Named per-strategy trial probabilities.
///
/// Only overrides are stored; a strategy without an entry uses its built-in
/// default. In TOML this is a plain table keyed by strategy tag:
///
/// ```toml
/// [probabilities]
/// random_max_len = 0.3
/// fork = 0.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct ProbabilityTable {
    overrides: BTreeMap<StrategyId, f64>,
}

impl ProbabilityTable {
    /// A table that uses the built-in default for every strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table assigning `probability` to every known strategy.
    pub fn uniform(probability: f64) -> Self {
        StrategyId::ALL.into_iter().map(|id| (id, probability)).collect()
    }

    /// Returns a copy with `id` set to `probability`.
    pub fn with(mut self, id: StrategyId, probability: f64) -> Self {
        self.set(id, probability);
        self
    }

    pub fn set(&mut self, id: StrategyId, probability: f64) {
        self.overrides.insert(id, probability);
    }

    pub fn probability(&self, id: StrategyId) -> f64 {
        self.overrides
            .get(&id)
            .copied()
            .unwrap_or_else(|| default_probability(id))
    }

    /// Checks that every override lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ProbabilityError> {
        for (strategy, value) in &self.overrides {
            if !(0.0..=1.0).contains(value) {
                return Err(ProbabilityError::OutOfRange {
                    strategy: *strategy,
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, f64>> for ProbabilityTable {
    type Error = CatalogError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(tag, value)| tag.parse::<StrategyId>().map(|id| (id, value)))
            .collect()
    }
}

impl FromIterator<(StrategyId, f64)> for ProbabilityTable {
    fn from_iter<T: IntoIterator<Item = (StrategyId, f64)>>(iter: T) -> Self {
        Self {
            overrides: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_fall_back_to_defaults() {
        let table = ProbabilityTable::new().with(StrategyId::Fork, 0.9);
        assert_eq!(table.probability(StrategyId::Fork), 0.9);
        assert_eq!(
            table.probability(StrategyId::MutatorPlugin),
            MUTATOR_PLUGIN_PROBABILITY
        );
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(ProbabilityTable::uniform(1.0).validate().is_ok());
        assert!(ProbabilityTable::uniform(0.0).validate().is_ok());
        assert_eq!(
            ProbabilityTable::new()
                .with(StrategyId::ValueProfile, 1.5)
                .validate(),
            Err(ProbabilityError::OutOfRange {
                strategy: StrategyId::ValueProfile,
                value: 1.5
            })
        );
        assert!(
            ProbabilityTable::new()
                .with(StrategyId::Fork, f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn deserializes_from_a_tag_keyed_toml_table() {
        let table: ProbabilityTable = toml::from_str("random_max_len = 0.3\nfork = 0.0\n").unwrap();
        assert_eq!(table.probability(StrategyId::RandomMaxLength), 0.3);
        assert_eq!(table.probability(StrategyId::Fork), 0.0);
        assert_eq!(
            table.probability(StrategyId::CorpusSubset),
            CORPUS_SUBSET_PROBABILITY
        );
    }

    #[test]
    fn unknown_tag_keys_fail_to_deserialize() {
        assert!(toml::from_str::<ProbabilityTable>("not_a_strategy = 0.5\n").is_err());
    }
}
