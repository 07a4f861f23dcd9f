use crate::catalog::StrategyCatalog;
use crate::combination::StrategyCombination;
use crate::default_pool::DefaultPoolGenerator;
use crate::pool::{PoolError, StrategyPool};
use crate::probability::ProbabilityTable;
use crate::random::RandomSource;
use crate::selection::{SelectionMethod, Temperature};
use crate::store::Distribution;
use std::fmt;

/// Why the bandit generator fell back to the default generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedData {
    EmptyDistribution,
    ZeroTotalWeight,
}

impl fmt::Display for DegradedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DegradedData::EmptyDistribution => "empty distribution",
            DegradedData::ZeroTotalWeight => "zero total weight",
        })
    }
}

/// Where a generated pool came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOrigin {
    /// The default method was requested.
    Default,
    /// A bandit method was requested but the data could not support a draw.
    Degraded(DegradedData),
    /// Record `index` of the distribution was drawn.
    Drawn {
        index: usize,
        combination: StrategyCombination,
    },
}

impl PoolOrigin {
    /// `true` when a bandit method fell back because of unusable data.
    pub fn is_degraded(&self) -> bool {
        matches!(self, PoolOrigin::Degraded(_))
    }
}

/// A pool together with its origin, for callers that count fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedPool {
    pub pool: StrategyPool,
    pub origin: PoolOrigin,
}

/// Multi-armed bandit pool generator.
///
/// Draws one historically tested combination with probability proportional
/// to its weight at the requested temperature, then applies the catalog's
/// overlay strategies with their own trials. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct BanditPoolGenerator {
    fallback: DefaultPoolGenerator,
    overlay_probabilities: ProbabilityTable,
}

impl BanditPoolGenerator {
    /// Creates a generator for `catalog`.
    ///
    /// `default_probabilities` drive the fallback generator and
    /// `overlay_probabilities` gate the catalog's overlay strategies.
    pub fn new(
        catalog: &'static StrategyCatalog,
        default_probabilities: ProbabilityTable,
        overlay_probabilities: ProbabilityTable,
    ) -> Self {
        Self {
            fallback: DefaultPoolGenerator::new(catalog, default_probabilities),
            overlay_probabilities,
        }
    }

    /// The catalog pools are built against.
    pub fn catalog(&self) -> &'static StrategyCatalog {
        self.fallback.catalog()
    }

    /// Generates a pool and reports its origin.
    ///
    /// Empty or zero-weight distributions fall back to the default generator
    /// before any draw is consumed. Fails only if the drawn combination
    /// itself violates an exclusion group.
    ///
    /// # Arguments
    /// * `method`: `Default` bypasses the distribution entirely; a bandit
    ///   method selects the temperature whose weights are used.
    /// * `distribution`: Snapshot of historical performance records.
    /// * `random`: Source of the weighted draw and of every trial.
    ///
    /// # Returns
    /// The pool together with a [`PoolOrigin`] describing how it was built,
    /// or [`PoolError::InvariantViolation`] for a conflicting combination.
    pub fn generate_with_origin(
        &self,
        method: SelectionMethod,
        distribution: &Distribution,
        random: &mut dyn RandomSource,
    ) -> Result<WeightedPool, PoolError> {
        let temperature = match method {
            SelectionMethod::Default => {
                return Ok(WeightedPool {
                    pool: self.fallback.generate(random),
                    origin: PoolOrigin::Default,
                });
            }
            SelectionMethod::Bandit(temperature) => temperature,
        };

        let index = match draw_weighted_index(distribution, temperature, random) {
            Ok(index) => index,
            Err(degraded) => {
                tracing::warn!(
                    method = %method,
                    catalog = self.catalog().name(),
                    reason = %degraded,
                    "No usable strategy distribution, falling back to default pool"
                );
                return Ok(WeightedPool {
                    pool: self.fallback.generate(random),
                    origin: PoolOrigin::Degraded(degraded),
                });
            }
        };

        let combination = distribution.records()[index].combination().clone();
        let pool = self.pool_for_combination(&combination, random)?;
        tracing::debug!(
            method = %method,
            index,
            combination = %combination,
            enabled = ?pool.enabled_ids(),
            "Drew strategy combination"
        );
        Ok(WeightedPool {
            pool,
            origin: PoolOrigin::Drawn { index, combination },
        })
    }

    /// Generates a pool for `method` from `distribution`.
    pub fn generate(
        &self,
        method: SelectionMethod,
        distribution: &Distribution,
        random: &mut dyn RandomSource,
    ) -> Result<StrategyPool, PoolError> {
        self.generate_with_origin(method, distribution, random)
            .map(|weighted| weighted.pool)
    }

    /// Enables the drawn combination plus any overlay strategies whose trial
    /// succeeds. An overlay is suppressed when its exclusion group already
    /// holds a drawn strategy.
    fn pool_for_combination(
        &self,
        combination: &StrategyCombination,
        random: &mut dyn RandomSource,
    ) -> Result<StrategyPool, PoolError> {
        let catalog = self.catalog();
        let mut enabled: Vec<_> = combination.iter().collect();
        // Surfaces combinations that break an exclusion group on their own.
        StrategyPool::new(catalog, enabled.iter().copied())?;

        for &overlay in catalog.overlays() {
            let probability = self.overlay_probabilities.probability(overlay);
            if !random.decide_with_probability(probability) || enabled.contains(&overlay) {
                continue;
            }
            let sibling_drawn = catalog
                .group_of(overlay)
                .is_some_and(|group| enabled.iter().any(|id| group.contains(id)));
            if sibling_drawn {
                tracing::debug!(
                    overlay = %overlay,
                    "Overlay suppressed by drawn strategy in the same exclusion group"
                );
                continue;
            }
            enabled.push(overlay);
        }

        StrategyPool::new(catalog, enabled)
    }
}

/// Roulette-wheel draw over the records of `distribution`.
///
/// Draws `r` from `[0, total)` and returns the first record whose running
/// weight strictly exceeds `r`. Zero-weight records are never selected.
///
/// Weights whose sum overflows `f64` are divided by the largest weight
/// before accumulating, which keeps every share at `w_i / Σw`.
///
/// # Arguments
/// * `distribution`: The records to draw from, in snapshot order.
/// * `temperature`: Which weight of each record to use.
/// * `random`: Source of the single uniform draw.
///
/// # Returns
/// The index of the drawn record, or the [`DegradedData`] reason when the
/// distribution cannot support a draw. No draw is consumed in that case.
pub fn draw_weighted_index(
    distribution: &Distribution,
    temperature: Temperature,
    random: &mut dyn RandomSource,
) -> Result<usize, DegradedData> {
    if distribution.is_empty() {
        return Err(DegradedData::EmptyDistribution);
    }
    let mut total = distribution.total_weight(temperature);
    let mut scale = 1.0;
    if !total.is_finite() {
        scale = distribution.max_weight(temperature);
        total = distribution
            .records()
            .iter()
            .map(|record| record.weight(temperature) / scale)
            .sum();
    }
    if total <= 0.0 {
        return Err(DegradedData::ZeroTotalWeight);
    }

    let r = random.next_below(total);
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, record) in distribution.records().iter().enumerate() {
        let weight = record.weight(temperature) / scale;
        if weight > 0.0 {
            last_positive = index;
        }
        cumulative += weight;
        if cumulative > r {
            return Ok(index);
        }
    }
    // Rounding can leave the running sum just below r.
    Ok(last_positive)
}

/// Convenience wrapper around [`BanditPoolGenerator::generate`].
pub fn generate_weighted_pool(
    catalog: &'static StrategyCatalog,
    method: SelectionMethod,
    distribution: &Distribution,
    default_probabilities: &ProbabilityTable,
    overlay_probabilities: &ProbabilityTable,
    random: &mut dyn RandomSource,
) -> Result<StrategyPool, PoolError> {
    BanditPoolGenerator::new(
        catalog,
        default_probabilities.clone(),
        overlay_probabilities.clone(),
    )
    .generate(method, distribution, random)
}
