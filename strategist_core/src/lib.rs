pub mod bandit;
pub mod catalog;
pub mod combination;
pub mod config;
pub mod default_pool;
pub mod pool;
pub mod probability;
pub mod random;
pub mod selection;
pub mod selector;
pub mod store;
pub mod strategy;

pub use bandit::{
    BanditPoolGenerator, DegradedData, PoolOrigin, WeightedPool, draw_weighted_index,
    generate_weighted_pool,
};
pub use catalog::{AFL, CatalogError, LIBFUZZER, StrategyCatalog};
pub use combination::StrategyCombination;
pub use config::StrategistConfig;
pub use default_pool::{DefaultPoolGenerator, generate_default_pool, resolve_exclusion_group};
pub use pool::{PoolError, StrategyPool};
pub use probability::{ProbabilityError, ProbabilityTable};
pub use random::{ConstantDraw, ForcedDecision, RandomSource, seeded_source};
pub use selection::{SelectionError, SelectionMethod, Temperature};
pub use selector::{Selection, StrategySelector};
pub use store::{
    Distribution, DistributionStore, InMemoryDistributionStore, JsonFileDistributionStore,
    PerformanceRecord, StoreError, StoredPerformanceRecord,
};
pub use strategy::StrategyId;
