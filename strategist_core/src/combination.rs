use crate::catalog::{CatalogError, StrategyCatalog};
use crate::strategy::StrategyId;
use std::collections::BTreeSet;
use std::fmt;

/// A set of strategies that was run together and tracked as one bandit arm.
///
/// Membership is order-insensitive and duplicates collapse. The empty
/// combination is valid and stands for a baseline run without extra strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StrategyCombination {
    ids: BTreeSet<StrategyId>,
}

impl StrategyCombination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a persisted combination string such as `"fork,corpus_subset,recommended_dict,"`.
    ///
    /// A single trailing comma and whitespace around tags are tolerated. Every
    /// tag must name a strategy of `catalog`; anything else is reported to the
    /// caller rather than dropped.
    pub fn parse(catalog: &StrategyCatalog, input: &str) -> Result<Self, CatalogError> {
        let trimmed = input.trim();
        let body = trimmed.strip_suffix(',').unwrap_or(trimmed);
        let mut combination = Self::new();
        if body.trim().is_empty() {
            return Ok(combination);
        }

        for (position, segment) in body.split(',').enumerate() {
            let tag = segment.trim();
            if tag.is_empty() {
                return Err(CatalogError::EmptyTag {
                    input: input.to_string(),
                    position,
                });
            }
            combination.insert(catalog.parse_tag(tag)?);
        }
        Ok(combination)
    }

    /// Adds a strategy. Returns `false` if it was already present.
    pub fn insert(&mut self, id: StrategyId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: StrategyId) -> bool {
        self.ids.contains(&id)
    }

    /// Members in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = StrategyId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Serializes in the persisted format: canonical order, every tag followed by a comma.
    pub fn to_tag_string(&self) -> String {
        self.ids.iter().map(|id| format!("{},", id.tag())).collect()
    }
}

impl fmt::Display for StrategyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tag_string())
    }
}

impl FromIterator<StrategyId> for StrategyCombination {
    fn from_iter<T: IntoIterator<Item = StrategyId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
