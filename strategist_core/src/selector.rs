use crate::bandit::{BanditPoolGenerator, PoolOrigin, WeightedPool};
use crate::catalog::StrategyCatalog;
use crate::config::StrategistConfig;
use crate::random::RandomSource;
use crate::selection::{SelectionError, SelectionMethod};
use crate::store::{Distribution, DistributionStore};

/// Outcome of selecting the pool for one fuzzing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub method: SelectionMethod,
    pub weighted: WeightedPool,
    /// Fingerprint of the snapshot consulted, if any.
    pub snapshot: Option<String>,
}

impl Selection {
    pub fn origin(&self) -> &PoolOrigin {
        &self.weighted.origin
    }
}

/// Per-session entry point wiring configuration, store and generators.
///
/// The store is only consulted when a bandit method is in force, and a
/// fresh snapshot is fetched for every session.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    method: SelectionMethod,
    generator: BanditPoolGenerator,
}

impl StrategySelector {
    pub fn new(method: SelectionMethod, generator: BanditPoolGenerator) -> Self {
        Self { method, generator }
    }

    /// Builds a selector from a validated configuration, applying the
    /// bandit switch.
    pub fn from_config(config: &StrategistConfig) -> Result<Self, SelectionError> {
        let catalog = config.catalog()?;
        Ok(Self::new(
            config.effective_method(),
            BanditPoolGenerator::new(
                catalog,
                config.probabilities.clone(),
                config.overlays.clone(),
            ),
        ))
    }

    pub fn method(&self) -> SelectionMethod {
        self.method
    }

    pub fn catalog(&self) -> &'static StrategyCatalog {
        self.generator.catalog()
    }

    /// Selects the pool for one session.
    ///
    /// # Arguments
    /// * `store`: Consulted once per call, and only in bandit mode.
    /// * `random`: Source of every draw and trial for this session.
    ///
    /// # Returns
    /// The pool with its origin and the snapshot fingerprint, or a
    /// `SelectionError` when the store fails or holds an invalid combination.
    pub fn select(
        &self,
        store: &dyn DistributionStore,
        random: &mut dyn RandomSource,
    ) -> Result<Selection, SelectionError> {
        let (distribution, snapshot) = match self.method {
            SelectionMethod::Default => (Distribution::default(), None),
            SelectionMethod::Bandit(_) => {
                let distribution = store.fetch_distribution(self.catalog())?;
                let fingerprint = distribution.fingerprint();
                tracing::debug!(
                    records = distribution.len(),
                    snapshot = %fingerprint,
                    "Fetched strategy distribution"
                );
                (distribution, Some(fingerprint))
            }
        };

        let weighted = self
            .generator
            .generate_with_origin(self.method, &distribution, random)?;
        Ok(Selection {
            method: self.method,
            weighted,
            snapshot,
        })
    }
}
