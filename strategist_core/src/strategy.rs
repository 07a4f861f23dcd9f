use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::CatalogError;

/// A single togglable fuzzing strategy.
///
/// The declaration order is the canonical order used when a combination is
/// serialized back into its persisted tag string, so new variants must be
/// appended rather than inserted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StrategyId {
    /// Corpus mutations generated by radamsa. First alternate mutator.
    #[serde(rename = "corpus_mutations_radamsa")]
    CorpusMutationRadamsa,
    /// Randomize the maximum input length passed to the engine.
    #[serde(rename = "random_max_len")]
    RandomMaxLength,
    /// Corpus mutations generated by an ML RNN model. Second alternate mutator.
    #[serde(rename = "corpus_mutations_ml_rnn")]
    CorpusMutationMlRnn,
    #[serde(rename = "value_profile")]
    ValueProfile,
    #[serde(rename = "fork")]
    Fork,
    /// Fuzz against a random subset of the corpus.
    #[serde(rename = "corpus_subset")]
    CorpusSubset,
    /// Inject the recommended dictionary from previous runs.
    #[serde(rename = "recommended_dict")]
    RecommendedDictionary,
    /// Custom mutator loaded as an engine plugin.
    #[serde(rename = "mutator_plugin")]
    MutatorPlugin,
}

impl StrategyId {
    /// Every known strategy, in canonical order.
    pub const ALL: [StrategyId; 8] = [
        StrategyId::CorpusMutationRadamsa,
        StrategyId::RandomMaxLength,
        StrategyId::CorpusMutationMlRnn,
        StrategyId::ValueProfile,
        StrategyId::Fork,
        StrategyId::CorpusSubset,
        StrategyId::RecommendedDictionary,
        StrategyId::MutatorPlugin,
    ];

    /// The tag used for this strategy in persisted combination strings.
    pub fn tag(self) -> &'static str {
        match self {
            StrategyId::CorpusMutationRadamsa => "corpus_mutations_radamsa",
            StrategyId::RandomMaxLength => "random_max_len",
            StrategyId::CorpusMutationMlRnn => "corpus_mutations_ml_rnn",
            StrategyId::ValueProfile => "value_profile",
            StrategyId::Fork => "fork",
            StrategyId::CorpusSubset => "corpus_subset",
            StrategyId::RecommendedDictionary => "recommended_dict",
            StrategyId::MutatorPlugin => "mutator_plugin",
        }
    }

    /// Looks up a strategy by its persisted tag. Returns `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.tag() == tag)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for StrategyId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::from_tag(s.trim()).ok_or_else(|| CatalogError::UnknownTag(s.to_string()))
    }
}
