use crate::catalog::{CatalogError, StrategyCatalog};
use crate::strategy::StrategyId;
use thiserror::Error;

/// Errors raised while building a [`StrategyPool`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// More than one member of a mutual-exclusion group was enabled. This
    /// points at a defect in combination parsing or overlay resolution and
    /// is never corrected silently.
    #[error("Mutually exclusive strategies enabled together: {enabled:?}")]
    InvariantViolation { enabled: Vec<StrategyId> },
    /// A strategy could not be resolved against the pool's catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// The resolved enabled/disabled state of every strategy for one fuzzing session.
///
/// Any strategy of the catalog that was not enabled reports `false`. A pool
/// is immutable once built and is discarded after the engine configuration
/// has been derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyPool {
    catalog: &'static StrategyCatalog,
    enabled: Vec<StrategyId>,
}

impl StrategyPool {
    /// Builds a pool from the set of enabled strategies.
    ///
    /// Duplicates are ignored and the first occurrence fixes the activation
    /// order. Fails if a strategy is not in `catalog` or if an exclusion
    /// group ends up with more than one enabled member.
    pub fn new(
        catalog: &'static StrategyCatalog,
        enabled: impl IntoIterator<Item = StrategyId>,
    ) -> Result<Self, PoolError> {
        let mut ids: Vec<StrategyId> = Vec::new();
        for id in enabled {
            catalog.ensure_contains(id)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        validate_exclusion_groups(catalog, &ids)?;
        Ok(Self {
            catalog,
            enabled: ids,
        })
    }

    /// Builds a pool from an explicit id→enabled mapping.
    pub fn from_states(
        catalog: &'static StrategyCatalog,
        states: impl IntoIterator<Item = (StrategyId, bool)>,
    ) -> Result<Self, PoolError> {
        let mut enabled = Vec::new();
        for (id, is_enabled) in states {
            catalog.ensure_contains(id)?;
            if is_enabled {
                enabled.push(id);
            }
        }
        Self::new(catalog, enabled)
    }

    /// For generators whose resolution procedure cannot produce an invalid pool.
    pub(crate) fn resolved(catalog: &'static StrategyCatalog, enabled: Vec<StrategyId>) -> Self {
        debug_assert!(validate_exclusion_groups(catalog, &enabled).is_ok());
        Self { catalog, enabled }
    }

    /// Returns whether `id` is enabled in this pool.
    ///
    /// Strategies outside the pool's catalog report `false`, so an `afl`
    /// pool answers `false` for `fork`. Use [`Self::do_strategy_named`] when
    /// such a lookup should be an error instead.
    pub fn do_strategy(&self, id: StrategyId) -> bool {
        self.enabled.contains(&id)
    }

    /// Looks up a strategy by its persisted tag.
    ///
    /// Unknown tags and strategies outside this pool's catalog are
    /// configuration errors, not a silent `false`.
    pub fn do_strategy_named(&self, tag: &str) -> Result<bool, CatalogError> {
        let id = self.catalog.parse_tag(tag)?;
        Ok(self.do_strategy(id))
    }

    /// Enabled strategies in activation order.
    pub fn enabled_ids(&self) -> &[StrategyId] {
        &self.enabled
    }

    /// Enabled state of every catalog strategy, in canonical order.
    pub fn states(&self) -> impl Iterator<Item = (StrategyId, bool)> + '_ {
        self.catalog
            .strategies()
            .iter()
            .map(|id| (*id, self.do_strategy(*id)))
    }

    /// The catalog this pool was resolved against.
    pub fn catalog(&self) -> &'static StrategyCatalog {
        self.catalog
    }

    /// `true` if no strategy is enabled.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

fn validate_exclusion_groups(
    catalog: &StrategyCatalog,
    enabled: &[StrategyId],
) -> Result<(), PoolError> {
    for group in catalog.exclusion_groups() {
        let members: Vec<StrategyId> = enabled
            .iter()
            .copied()
            .filter(|id| group.contains(id))
            .collect();
        if members.len() > 1 {
            return Err(PoolError::InvariantViolation { enabled: members });
        }
    }
    Ok(())
}
