use crate::strategy::StrategyId;
use thiserror::Error;

/// Errors raised when a strategy tag or engine name cannot be resolved
/// against a catalog. These are configuration errors and are never
/// recovered locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The tag does not name any known strategy.
    #[error("Unknown strategy tag '{0}'")]
    UnknownTag(String),
    /// The strategy exists but is not part of the catalog it was used with.
    #[error("Strategy '{strategy}' is not part of the {catalog} catalog")]
    NotInCatalog {
        strategy: StrategyId,
        catalog: &'static str,
    },
    /// A combination string contained an empty segment other than the
    /// trailing one (e.g. `"fork,,value_profile,"`).
    #[error("Empty strategy tag at position {position} in '{input}'")]
    EmptyTag { input: String, position: usize },
    /// No catalog is registered for the requested engine.
    #[error("Unknown fuzzing engine '{0}'")]
    UnknownEngine(String),
}

/// Static description of the strategies available to one fuzzing engine.
///
/// `strategies` is the canonical order, `exclusion_groups` lists the sets of
/// strategies of which at most one may be enabled (each in priority order),
/// and `overlays` are the strategies that the bandit generator gates with
/// their own probability regardless of the drawn combination.
#[derive(Debug, PartialEq, Eq)]
pub struct StrategyCatalog {
    name: &'static str,
    strategies: &'static [StrategyId],
    exclusion_groups: &'static [&'static [StrategyId]],
    overlays: &'static [StrategyId],
}

/// Catalog for libFuzzer targets. Radamsa takes priority over the ML RNN
/// mutator when both trials would succeed.
pub static LIBFUZZER: StrategyCatalog = StrategyCatalog::new(
    "libFuzzer",
    &StrategyId::ALL,
    &[&[
        StrategyId::CorpusMutationRadamsa,
        StrategyId::CorpusMutationMlRnn,
    ]],
    &[StrategyId::MutatorPlugin],
);

/// Catalog for AFL targets.
pub static AFL: StrategyCatalog =
    StrategyCatalog::new("afl", &[StrategyId::CorpusSubset], &[], &[]);

static ENGINES: [&StrategyCatalog; 2] = [&LIBFUZZER, &AFL];

impl StrategyCatalog {
    /// Describes a catalog. Every id in `exclusion_groups` and `overlays`
    /// is expected to also appear in `strategies`.
    pub const fn new(
        name: &'static str,
        strategies: &'static [StrategyId],
        exclusion_groups: &'static [&'static [StrategyId]],
        overlays: &'static [StrategyId],
    ) -> Self {
        Self {
            name,
            strategies,
            exclusion_groups,
            overlays,
        }
    }

    /// Resolves the catalog registered for an engine name (`"libFuzzer"`, `"afl"`).
    pub fn for_engine(engine: &str) -> Result<&'static StrategyCatalog, CatalogError> {
        ENGINES
            .iter()
            .copied()
            .find(|catalog| catalog.name == engine)
            .ok_or_else(|| CatalogError::UnknownEngine(engine.to_string()))
    }

    /// Engine name the catalog is registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All strategies of the engine in canonical order.
    pub fn strategies(&self) -> &'static [StrategyId] {
        self.strategies
    }

    /// Mutual-exclusion groups, each listed in priority order.
    pub fn exclusion_groups(&self) -> &'static [&'static [StrategyId]] {
        self.exclusion_groups
    }

    /// Strategies the bandit generator decides with their own trial.
    pub fn overlays(&self) -> &'static [StrategyId] {
        self.overlays
    }

    /// Returns whether `id` belongs to this engine.
    pub fn contains(&self, id: StrategyId) -> bool {
        self.strategies.contains(&id)
    }

    /// Returns the exclusion group `id` belongs to, if any.
    pub fn group_of(&self, id: StrategyId) -> Option<&'static [StrategyId]> {
        self.exclusion_groups
            .iter()
            .copied()
            .find(|group| group.contains(&id))
    }

    /// Strategies that are decided by a single independent trial.
    pub fn independent(&self) -> impl Iterator<Item = StrategyId> + '_ {
        self.strategies
            .iter()
            .copied()
            .filter(|id| self.group_of(*id).is_none())
    }

    /// Resolves a persisted tag, requiring the strategy to be part of this catalog.
    pub fn parse_tag(&self, tag: &str) -> Result<StrategyId, CatalogError> {
        let id: StrategyId = tag.parse()?;
        self.ensure_contains(id)?;
        Ok(id)
    }

    pub(crate) fn ensure_contains(&self, id: StrategyId) -> Result<(), CatalogError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(CatalogError::NotInCatalog {
                strategy: id,
                catalog: self.name,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn each_strategy_belongs_to_at_most_one_group() {
        for catalog in ENGINES {
            let mut seen = HashSet::new();
            for group in catalog.exclusion_groups() {
                for id in group.iter() {
                    assert!(
                        seen.insert(*id),
                        "{} appears in more than one exclusion group of {}",
                        id,
                        catalog.name()
                    );
                    assert!(catalog.contains(*id));
                }
            }
            for id in catalog.overlays() {
                assert!(catalog.contains(*id));
            }
        }
    }

    #[test]
    fn libfuzzer_groups_alternate_mutators_with_radamsa_first() {
        let group = LIBFUZZER
            .group_of(StrategyId::CorpusMutationMlRnn)
            .expect("ML RNN should be in an exclusion group");
        assert_eq!(
            group,
            &[
                StrategyId::CorpusMutationRadamsa,
                StrategyId::CorpusMutationMlRnn
            ]
        );
        assert!(LIBFUZZER.group_of(StrategyId::Fork).is_none());
    }

    #[test]
    fn independent_strategies_exclude_grouped_ones() {
        let independent: Vec<_> = LIBFUZZER.independent().collect();
        assert_eq!(independent.len(), 6);
        assert!(!independent.contains(&StrategyId::CorpusMutationRadamsa));
        assert!(!independent.contains(&StrategyId::CorpusMutationMlRnn));
        assert!(independent.contains(&StrategyId::MutatorPlugin));
    }

    #[test]
    fn for_engine_resolves_known_engines() {
        assert_eq!(StrategyCatalog::for_engine("libFuzzer").unwrap().name(), "libFuzzer");
        assert_eq!(StrategyCatalog::for_engine("afl").unwrap().name(), "afl");
        assert_eq!(
            StrategyCatalog::for_engine("honggfuzz"),
            Err(CatalogError::UnknownEngine("honggfuzz".to_string()))
        );
    }

    #[test]
    fn parse_tag_rejects_strategies_outside_the_catalog() {
        assert_eq!(AFL.parse_tag("corpus_subset"), Ok(StrategyId::CorpusSubset));
        assert_eq!(
            AFL.parse_tag("fork"),
            Err(CatalogError::NotInCatalog {
                strategy: StrategyId::Fork,
                catalog: "afl"
            })
        );
        assert_eq!(
            LIBFUZZER.parse_tag("bogus"),
            Err(CatalogError::UnknownTag("bogus".to_string()))
        );
    }
}
