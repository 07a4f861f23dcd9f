use crate::catalog::CatalogError;
use crate::pool::PoolError;
use crate::store::StoreError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors surfaced by pool selection. Degraded historical data is not an
/// error; it falls back to the default generator.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Unknown strategy selection method '{0}'")]
    UnknownMethod(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Weight tier of the historical distribution.
///
/// Low concentrates weight on historically safe combinations, high spreads
/// it toward experimental ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temperature {
    Low,
    Medium,
    High,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Temperature::Low => "low",
            Temperature::Medium => "medium",
            Temperature::High => "high",
        })
    }
}

/// How a session's strategy pool is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum SelectionMethod {
    /// Pure exploration through independent probability trials.
    #[default]
    Default,
    /// Weighted draw over the historical distribution at one temperature.
    Bandit(Temperature),
}

impl SelectionMethod {
    pub const ALL: [SelectionMethod; 4] = [
        SelectionMethod::Default,
        SelectionMethod::Bandit(Temperature::Low),
        SelectionMethod::Bandit(Temperature::Medium),
        SelectionMethod::Bandit(Temperature::High),
    ];

    /// The name recorded alongside fuzzing stats for this method.
    pub fn name(self) -> &'static str {
        match self {
            SelectionMethod::Default => "default",
            SelectionMethod::Bandit(Temperature::Low) => "multi_armed_bandit_low",
            SelectionMethod::Bandit(Temperature::Medium) => "multi_armed_bandit_medium",
            SelectionMethod::Bandit(Temperature::High) => "multi_armed_bandit_high",
        }
    }

    pub fn temperature(self) -> Option<Temperature> {
        match self {
            SelectionMethod::Default => None,
            SelectionMethod::Bandit(temperature) => Some(temperature),
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectionMethod {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.name() == name)
            .ok_or_else(|| SelectionError::UnknownMethod(s.to_string()))
    }
}

impl TryFrom<String> for SelectionMethod {
    type Error = SelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_parse_back() {
        for method in SelectionMethod::ALL {
            assert_eq!(method.name().parse::<SelectionMethod>().unwrap(), method);
        }
        assert_eq!(
            "multi_armed_bandit_high".parse::<SelectionMethod>().unwrap(),
            SelectionMethod::Bandit(Temperature::High)
        );
    }

    #[test]
    fn unknown_method_is_a_configuration_error() {
        match "multi_armed_bandit_extreme".parse::<SelectionMethod>() {
            Err(SelectionError::UnknownMethod(name)) => {
                assert_eq!(name, "multi_armed_bandit_extreme")
            }
            other => panic!("Expected UnknownMethod, got {:?}", other),
        }
    }

    #[test]
    fn default_method_has_no_temperature() {
        assert_eq!(SelectionMethod::default().temperature(), None);
        assert_eq!(
            SelectionMethod::Bandit(Temperature::Low).temperature(),
            Some(Temperature::Low)
        );
    }
}
