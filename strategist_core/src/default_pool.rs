use crate::catalog::StrategyCatalog;
use crate::pool::StrategyPool;
use crate::probability::ProbabilityTable;
use crate::random::RandomSource;
use crate::strategy::StrategyId;

/// Builds strategy pools from probability trials alone.
///
/// This is the exploration path and the fallback whenever historical data
/// is unavailable, so generation is total: any probability table and any
/// random source yield a valid pool.
#[derive(Debug, Clone)]
pub struct DefaultPoolGenerator {
    catalog: &'static StrategyCatalog,
    probabilities: ProbabilityTable,
}

impl DefaultPoolGenerator {
    /// Creates a generator for `catalog` using the trial probabilities in
    /// `probabilities`.
    pub fn new(catalog: &'static StrategyCatalog, probabilities: ProbabilityTable) -> Self {
        Self {
            catalog,
            probabilities,
        }
    }

    pub fn catalog(&self) -> &'static StrategyCatalog {
        self.catalog
    }

    /// Trial probabilities, with built-in defaults for missing entries.
    pub fn probabilities(&self) -> &ProbabilityTable {
        &self.probabilities
    }

    /// Generates one pool.
    ///
    /// Exclusion groups are resolved first, each in its declared priority
    /// order. Every strategy outside a group then gets one independent trial.
    ///
    /// # Arguments
    /// * `random`: Source of the Bernoulli trials. A seeded source makes the
    ///   sequence of pools reproducible.
    ///
    /// # Returns
    /// A pool that never holds two members of one exclusion group. Generation
    /// cannot fail.
    pub fn generate(&self, random: &mut dyn RandomSource) -> StrategyPool {
        let mut enabled = Vec::new();

        for group in self.catalog.exclusion_groups() {
            let candidates = group
                .iter()
                .map(|id| (*id, self.probabilities.probability(*id)));
            if let Some(winner) = resolve_exclusion_group(candidates, random) {
                enabled.push(winner);
            }
        }

        for id in self.catalog.independent() {
            if random.decide_with_probability(self.probabilities.probability(id)) {
                enabled.push(id);
            }
        }

        tracing::debug!(
            catalog = self.catalog.name(),
            enabled = ?enabled,
            "Generated default strategy pool"
        );
        StrategyPool::resolved(self.catalog, enabled)
    }
}

/// Resolves one mutual-exclusion group.
///
/// Candidates are tried in order with one trial each. The first success wins
/// and the remaining candidates are not evaluated, so a later member is only
/// considered when every earlier one was skipped.
pub fn resolve_exclusion_group(
    candidates: impl IntoIterator<Item = (StrategyId, f64)>,
    random: &mut dyn RandomSource,
) -> Option<StrategyId> {
    candidates
        .into_iter()
        .find(|(_, probability)| random.decide_with_probability(*probability))
        .map(|(id, _)| id)
}

/// Convenience wrapper around [`DefaultPoolGenerator::generate`].
pub fn generate_default_pool(
    catalog: &'static StrategyCatalog,
    probabilities: &ProbabilityTable,
    random: &mut dyn RandomSource,
) -> StrategyPool {
    DefaultPoolGenerator::new(catalog, probabilities.clone()).generate(random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AFL, LIBFUZZER};
    use crate::random::{ConstantDraw, ForcedDecision, seeded_source};

    #[test]
    fn forced_trials_enable_first_group_member_and_every_independent_strategy() {
        let pool = generate_default_pool(
            &LIBFUZZER,
            &ProbabilityTable::new(),
            &mut ForcedDecision(true),
        );

        // Radamsa is declared first in its group, so ML RNN is never reached.
        assert!(pool.do_strategy(StrategyId::CorpusMutationRadamsa));
        assert!(!pool.do_strategy(StrategyId::CorpusMutationMlRnn));
        assert!(pool.do_strategy(StrategyId::CorpusSubset));
        assert!(pool.do_strategy(StrategyId::RandomMaxLength));
        assert!(pool.do_strategy(StrategyId::RecommendedDictionary));
        assert!(pool.do_strategy(StrategyId::ValueProfile));
        assert!(pool.do_strategy(StrategyId::Fork));
        assert!(pool.do_strategy(StrategyId::MutatorPlugin));
    }

    #[test]
    fn failing_trials_enable_nothing() {
        let pool = generate_default_pool(
            &LIBFUZZER,
            &ProbabilityTable::new(),
            &mut ForcedDecision(false),
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn all_zero_and_all_one_tables_are_deterministic_with_real_rng() {
        let mut rng = seeded_source(5);
        for _ in 0..200 {
            let none =
                generate_default_pool(&LIBFUZZER, &ProbabilityTable::uniform(0.0), &mut rng);
            assert!(none.is_empty(), "Expected empty pool, got {:?}", none);

            let all = generate_default_pool(&LIBFUZZER, &ProbabilityTable::uniform(1.0), &mut rng);
            assert_eq!(all.enabled_ids().len(), LIBFUZZER.strategies().len() - 1);
            assert!(all.do_strategy(StrategyId::CorpusMutationRadamsa));
            assert!(!all.do_strategy(StrategyId::CorpusMutationMlRnn));
        }
    }

    #[test]
    fn second_group_member_is_considered_only_when_first_is_skipped() {
        let table = ProbabilityTable::new()
            .with(StrategyId::CorpusMutationRadamsa, 0.0)
            .with(StrategyId::CorpusMutationMlRnn, 1.0);
        let pool = generate_default_pool(&LIBFUZZER, &table, &mut ConstantDraw(0.5));
        assert!(!pool.do_strategy(StrategyId::CorpusMutationRadamsa));
        assert!(pool.do_strategy(StrategyId::CorpusMutationMlRnn));
    }

    #[test]
    fn resolve_exclusion_group_stops_at_first_success() {
        let winner = resolve_exclusion_group(
            [
                (StrategyId::Fork, 0.2),
                (StrategyId::ValueProfile, 0.6),
                (StrategyId::CorpusSubset, 0.9),
            ],
            &mut ConstantDraw(0.5),
        );
        assert_eq!(winner, Some(StrategyId::ValueProfile));
        assert_eq!(
            resolve_exclusion_group(std::iter::empty(), &mut ForcedDecision(true)),
            None
        );
    }

    #[test]
    fn sequential_priority_splits_group_activation() {
        let table = ProbabilityTable::uniform(0.0)
            .with(StrategyId::CorpusMutationRadamsa, 0.5)
            .with(StrategyId::CorpusMutationMlRnn, 1.0);
        let mut rng = seeded_source(99);
        let trials = 10_000;
        let mut radamsa = 0;
        let mut ml_rnn = 0;
        for _ in 0..trials {
            let pool = generate_default_pool(&LIBFUZZER, &table, &mut rng);
            if pool.do_strategy(StrategyId::CorpusMutationRadamsa) {
                radamsa += 1;
            }
            if pool.do_strategy(StrategyId::CorpusMutationMlRnn) {
                ml_rnn += 1;
            }
        }
        assert_eq!(radamsa + ml_rnn, trials);
        let radamsa_share = radamsa as f64 / trials as f64;
        assert!(
            (radamsa_share - 0.5).abs() < 0.03,
            "Radamsa share {} should be close to 0.5",
            radamsa_share
        );
    }

    #[test]
    fn independent_trial_frequency_tracks_probability() {
        let table = ProbabilityTable::uniform(0.0).with(StrategyId::Fork, 0.3);
        let mut rng = seeded_source(1234);
        let trials = 10_000;
        let enabled = (0..trials)
            .filter(|_| generate_default_pool(&LIBFUZZER, &table, &mut rng).do_strategy(StrategyId::Fork))
            .count();
        let share = enabled as f64 / trials as f64;
        assert!((share - 0.3).abs() < 0.03, "Fork share {} should be close to 0.3", share);
    }

    #[test]
    fn afl_catalog_only_decides_corpus_subset() {
        let pool = generate_default_pool(&AFL, &ProbabilityTable::new(), &mut ForcedDecision(true));
        assert_eq!(pool.enabled_ids(), &[StrategyId::CorpusSubset]);
    }
}
