use crate::catalog::{CatalogError, StrategyCatalog};
use crate::combination::StrategyCombination;
use crate::selection::Temperature;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Engine assumed for persisted records that do not name one.
pub const DEFAULT_RECORD_ENGINE: &str = "libFuzzer";

/// Errors that can occur while loading a distribution snapshot.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An I/O error occurred while reading the backing storage.
    #[error("Distribution store I/O error: {0}")]
    Io(String),

    /// The backing data could not be decoded.
    #[error("Distribution store deserialization error: {0}")]
    Deserialization(String),

    /// Rows could not be encoded for writing.
    #[error("Distribution store serialization error: {0}")]
    Serialization(String),

    /// A record carried a negative or non-finite weight.
    #[error("Invalid {temperature} weight {value} for combination '{combination}'")]
    InvalidWeight {
        combination: String,
        temperature: Temperature,
        value: f64,
    },

    /// A record referenced a strategy the catalog does not know.
    #[error("Invalid combination '{combination}': {source}")]
    InvalidCombination {
        combination: String,
        #[source]
        source: CatalogError,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Deserialization(format!("JSON decoding error: {}", err))
    }
}

impl StoreError {
    fn encoding(err: serde_json::Error) -> Self {
        StoreError::Serialization(format!("JSON encoding error: {}", err))
    }
}

/// Historical performance of one strategy combination.
///
/// Weights are relative per temperature tier and need not be normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    combination: StrategyCombination,
    weight_low: f64,
    weight_medium: f64,
    weight_high: f64,
    run_count: u64,
}

impl PerformanceRecord {
    /// Creates a record, rejecting negative or non-finite weights.
    pub fn new(
        combination: StrategyCombination,
        weight_low: f64,
        weight_medium: f64,
        weight_high: f64,
    ) -> Result<Self, StoreError> {
        for (temperature, value) in [
            (Temperature::Low, weight_low),
            (Temperature::Medium, weight_medium),
            (Temperature::High, weight_high),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StoreError::InvalidWeight {
                    combination: combination.to_tag_string(),
                    temperature,
                    value,
                });
            }
        }
        Ok(Self {
            combination,
            weight_low,
            weight_medium,
            weight_high,
            run_count: 0,
        })
    }

    /// A record with the same weight for every temperature.
    pub fn uniform(combination: StrategyCombination, weight: f64) -> Result<Self, StoreError> {
        Self::new(combination, weight, weight, weight)
    }

    pub fn with_run_count(mut self, run_count: u64) -> Self {
        self.run_count = run_count;
        self
    }

    /// The strategies enabled together in the recorded runs.
    pub fn combination(&self) -> &StrategyCombination {
        &self.combination
    }

    /// Selection weight of the record at `temperature`.
    pub fn weight(&self, temperature: Temperature) -> f64 {
        match temperature {
            Temperature::Low => self.weight_low,
            Temperature::Medium => self.weight_medium,
            Temperature::High => self.weight_high,
        }
    }

    /// Number of fuzzing runs the weights were computed from.
    pub fn run_count(&self) -> u64 {
        self.run_count
    }
}

/// Ordered snapshot of performance records for one invocation.
///
/// Snapshots are loaded fresh for every selection and never cached, since
/// the aggregation job rewrites them over time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    records: Vec<PerformanceRecord>,
}

impl Distribution {
    pub fn new(records: Vec<PerformanceRecord>) -> Self {
        Self { records }
    }

    /// Records in snapshot order.
    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the weights at `temperature`. May be infinite when many large
    /// finite weights are present.
    pub fn total_weight(&self, temperature: Temperature) -> f64 {
        self.records.iter().map(|r| r.weight(temperature)).sum()
    }

    /// Largest weight at `temperature`, or `0.0` for an empty distribution.
    pub fn max_weight(&self, temperature: Temperature) -> f64 {
        self.records
            .iter()
            .map(|r| r.weight(temperature))
            .fold(0.0, f64::max)
    }

    /// MD5 digest over the records in order, used to tie log lines to the
    /// snapshot that produced a pool.
    pub fn fingerprint(&self) -> String {
        let mut context = md5::Context::new();
        for record in &self.records {
            let line = format!(
                "{}|{}|{}|{}\n",
                record.combination.to_tag_string(),
                record.weight_low,
                record.weight_medium,
                record.weight_high
            );
            context.consume(line.as_bytes());
        }
        format!("{:x}", context.compute())
    }
}

impl FromIterator<PerformanceRecord> for Distribution {
    fn from_iter<T: IntoIterator<Item = PerformanceRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Read contract for historical performance data.
///
/// Implementations own connectivity and retries; the selection core only
/// asks for a fresh snapshot scoped to one engine catalog.
pub trait DistributionStore: Send + Sync {
    /// Fetches the current distribution for the engine described by `catalog`.
    ///
    /// # Arguments
    /// * `catalog`: The engine catalog. Rows of other engines are skipped and
    ///   tags are resolved against it.
    ///
    /// # Returns
    /// The records in stored order, possibly empty, or a `StoreError` if the
    /// backing data is unreadable, malformed, or names an unknown strategy.
    fn fetch_distribution(
        &self,
        catalog: &'static StrategyCatalog,
    ) -> Result<Distribution, StoreError>;
}

/// A record as persisted by the aggregation job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredPerformanceRecord {
    /// Comma-separated strategy tags, usually with a trailing comma.
    pub strategy_name: String,
    pub probability_low_temperature: f64,
    pub probability_medium_temperature: f64,
    pub probability_high_temperature: f64,
    #[serde(default = "default_record_engine")]
    pub engine: String,
    #[serde(default)]
    pub run_count: u64,
}

fn default_record_engine() -> String {
    DEFAULT_RECORD_ENGINE.to_string()
}

impl StoredPerformanceRecord {
    /// Parses the persisted form against `catalog`.
    pub fn to_record(
        &self,
        catalog: &StrategyCatalog,
    ) -> Result<PerformanceRecord, StoreError> {
        let combination =
            StrategyCombination::parse(catalog, &self.strategy_name).map_err(|source| {
                StoreError::InvalidCombination {
                    combination: self.strategy_name.clone(),
                    source,
                }
            })?;
        Ok(PerformanceRecord::new(
            combination,
            self.probability_low_temperature,
            self.probability_medium_temperature,
            self.probability_high_temperature,
        )?
        .with_run_count(self.run_count))
    }
}

/// Turns stored rows into a distribution for one engine, keeping row order
/// and skipping rows of other engines.
pub fn distribution_from_stored(
    catalog: &StrategyCatalog,
    stored: &[StoredPerformanceRecord],
) -> Result<Distribution, StoreError> {
    stored
        .iter()
        .filter(|row| row.engine == catalog.name())
        .map(|row| row.to_record(catalog))
        .collect()
}

/// A store backed by rows held in memory. Useful for tests and for callers
/// that fetch rows themselves.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDistributionStore {
    rows: Vec<StoredPerformanceRecord>,
}

impl InMemoryDistributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<StoredPerformanceRecord>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: StoredPerformanceRecord) {
        self.rows.push(row);
    }
}

impl DistributionStore for InMemoryDistributionStore {
    fn fetch_distribution(
        &self,
        catalog: &'static StrategyCatalog,
    ) -> Result<Distribution, StoreError> {
        distribution_from_stored(catalog, &self.rows)
    }
}

/// A store reading a JSON array of [`StoredPerformanceRecord`] from disk.
///
/// The file is re-read on every fetch. A missing file means no historical
/// data yet and yields an empty distribution.
#[derive(Debug, Clone)]
pub struct JsonFileDistributionStore {
    path: PathBuf,
}

impl JsonFileDistributionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes rows in the format `fetch_distribution` reads.
    pub fn write_rows(&self, rows: &[StoredPerformanceRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(rows)
            .map_err(StoreError::encoding)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl DistributionStore for JsonFileDistributionStore {
    fn fetch_distribution(
        &self,
        catalog: &'static StrategyCatalog,
    ) -> Result<Distribution, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Distribution file not found, treating as empty"
                );
                return Ok(Distribution::default());
            }
            Err(err) => return Err(err.into()),
        };
        let rows: Vec<StoredPerformanceRecord> = serde_json::from_str(&content)?;
        let distribution = distribution_from_stored(catalog, &rows)?;
        tracing::debug!(
            path = %self.path.display(),
            engine = catalog.name(),
            rows = rows.len(),
            records = distribution.len(),
            "Loaded distribution snapshot"
        );
        Ok(distribution)
    }
}
