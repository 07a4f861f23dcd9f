use crate::catalog::{CatalogError, StrategyCatalog};
use crate::probability::ProbabilityTable;
use crate::selection::SelectionMethod;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SelectionSettings {
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default)]
    pub method: SelectionMethod,
    /// Master switch for bandit selection. When off, every session uses the
    /// default generator whatever `method` says.
    #[serde(default)]
    pub use_bandit: bool,
}

pub fn default_engine() -> String {
    "libFuzzer".to_string()
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            method: SelectionMethod::Default,
            use_bandit: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct DistributionSettings {
    /// JSON snapshot written by the aggregation job.
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct StrategistConfig {
    #[serde(default)]
    pub selection: SelectionSettings,
    /// Trial probabilities for the default generator.
    #[serde(default)]
    pub probabilities: ProbabilityTable,
    /// Trial probabilities for overlay strategies in bandit mode.
    #[serde(default)]
    pub overlays: ProbabilityTable,
    #[serde(default)]
    pub distribution: Option<DistributionSettings>,
}

impl StrategistConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config = Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to load config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: StrategistConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the engine is known and every probability lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.catalog()?;
        self.probabilities
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [probabilities] entry: {}", e))?;
        self.overlays
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [overlays] entry: {}", e))?;
        Ok(())
    }

    pub fn catalog(&self) -> Result<&'static StrategyCatalog, CatalogError> {
        StrategyCatalog::for_engine(&self.selection.engine)
    }

    /// The method actually in force once the bandit switch is applied.
    pub fn effective_method(&self) -> SelectionMethod {
        if self.selection.use_bandit {
            self.selection.method
        } else {
            SelectionMethod::Default
        }
    }

    pub fn distribution_path(&self) -> Option<&Path> {
        self.distribution
            .as_ref()
            .and_then(|settings| settings.path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probability::{FORK_PROBABILITY, MUTATOR_PLUGIN_PROBABILITY};
    use crate::selection::Temperature;
    use crate::strategy::StrategyId;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StrategistConfig::from_toml_str("").unwrap();
        assert_eq!(config.selection.engine, "libFuzzer");
        assert_eq!(config.selection.method, SelectionMethod::Default);
        assert!(!config.selection.use_bandit);
        assert_eq!(config.catalog().unwrap().name(), "libFuzzer");
        assert_eq!(config.probabilities.probability(StrategyId::Fork), FORK_PROBABILITY);
        assert_eq!(
            config.overlays.probability(StrategyId::MutatorPlugin),
            MUTATOR_PLUGIN_PROBABILITY
        );
        assert!(config.distribution_path().is_none());
    }

    #[test]
    fn full_document_is_parsed() {
        let config = StrategistConfig::from_toml_str(
            r#"
            [selection]
            engine = "libFuzzer"
            method = "multi_armed_bandit_medium"
            use-bandit = true

            [probabilities]
            random_max_len = 0.3

            [overlays]
            mutator_plugin = 1.0

            [distribution]
            path = "snapshots/distribution.json"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.effective_method(),
            SelectionMethod::Bandit(Temperature::Medium)
        );
        assert_eq!(
            config.probabilities.probability(StrategyId::RandomMaxLength),
            0.3
        );
        assert_eq!(config.overlays.probability(StrategyId::MutatorPlugin), 1.0);
        assert_eq!(
            config.distribution_path(),
            Some(Path::new("snapshots/distribution.json"))
        );
    }

    #[test]
    fn bandit_switch_off_forces_default_method() {
        let config = StrategistConfig::from_toml_str(
            "[selection]\nmethod = \"multi_armed_bandit_high\"\n",
        )
        .unwrap();
        assert_eq!(
            config.selection.method,
            SelectionMethod::Bandit(Temperature::High)
        );
        assert_eq!(config.effective_method(), SelectionMethod::Default);
    }

    #[test]
    fn invalid_documents_are_rejected() {
        for document in [
            "[selection]\nmethod = \"multi_armed_bandit_extreme\"\n",
            "[selection]\nengine = \"honggfuzz\"\n",
            "[selection]\nunknown-key = 1\n",
            "[probabilities]\nfork = 1.5\n",
            "[overlays]\nmutator_plugin = -0.1\n",
            "[probabilities]\nnot_a_strategy = 0.5\n",
        ] {
            assert!(
                StrategistConfig::from_toml_str(document).is_err(),
                "Document should be rejected:\n{}",
                document
            );
        }
    }

    #[test]
    fn load_from_file_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[selection]\nengine = \"afl\"").unwrap();
        let config = StrategistConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.catalog().unwrap().name(), "afl");

        let missing = file.path().with_extension("missing");
        assert!(StrategistConfig::load_from_file(&missing).is_err());
    }
}
