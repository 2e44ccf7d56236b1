use std::fmt;
use std::path::Path;

use config as cfg;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BenchError, Result};

/// Environment prefix; `THREADBENCH__QUEUE__PRODUCERS=4` overrides `queue.producers`.
pub const ENV_PREFIX: &str = "THREADBENCH";

/// Synchronization strategy applied to the producer/consumer workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Regime {
    Unsynchronized,
    FlagGated,
    MutexGated,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Unsynchronized, Regime::FlagGated, Regime::MutexGated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsynchronized => "unsynchronized",
            Self::FlagGated => "flag-gated",
            Self::MutexGated => "mutex-gated",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Unsynchronized => "no synchronization at all (data race)",
            Self::FlagGated => "atomic completion flag, unprotected queue",
            Self::MutexGated => "every push and pop under one lock",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a mutex-gated consumer stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutexTermination {
    /// Stop on the first empty observation, even if producers have not pushed yet.
    #[default]
    ObservedEmpty,
    /// Keep polling until producers are done and the queue is drained.
    ProducersDone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub producers: usize,
    pub consumers: usize,
    pub tasks_per_producer: usize,
    /// Regimes to run, in order.
    pub regimes: Vec<Regime>,
    pub mutex_termination: MutexTermination,
    /// Cap on threads one regime may start; unlimited when unset.
    pub max_threads: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            producers: 2,
            consumers: 2,
            tasks_per_producer: 1000,
            regimes: Regime::ALL.to_vec(),
            mutex_termination: MutexTermination::default(),
            max_threads: None,
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<()> {
        if self.producers == 0 {
            return Err(BenchError::InvalidConfig(
                "queue.producers must be at least 1".into(),
            ));
        }
        if self.producers > u32::MAX as usize || self.tasks_per_producer > u32::MAX as usize {
            return Err(BenchError::InvalidConfig(format!(
                "queue.producers and queue.tasks_per_producer must fit in {} bits",
                u32::BITS
            )));
        }
        if self.regimes.is_empty() {
            return Err(BenchError::InvalidConfig(
                "queue.regimes must name at least one regime".into(),
            ));
        }
        if self.max_threads == Some(0) {
            return Err(BenchError::InvalidConfig(
                "queue.max_threads must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub array_size: usize,
    /// Partition counts to compare against the single-threaded baseline.
    pub chunk_counts: Vec<usize>,
    /// Fixed PRNG seed for the input array; random when unset.
    pub seed: Option<u64>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            array_size: 1_000_000,
            chunk_counts: vec![2, 4, 8],
            seed: None,
        }
    }
}

impl SortConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_counts.is_empty() {
            return Err(BenchError::InvalidConfig(
                "sort.chunk_counts must contain at least one entry".into(),
            ));
        }
        if self.chunk_counts.contains(&0) {
            return Err(BenchError::InvalidConfig(
                "sort.chunk_counts entries must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Main configuration for both harnesses
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub queue: QueueConfig,
    pub sort: SortConfig,
}

impl BenchConfig {
    /// Load configuration from the optional file, then `THREADBENCH__*` environment variables.
    /// Keys missing from every source keep their defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = cfg::Config::builder();
        if let Some(path) = file {
            if !path.exists() {
                return Err(BenchError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading configuration from {:?}", path);
            builder = builder.add_source(cfg::File::from(path.to_path_buf()).required(true));
        }
        builder = builder.add_source(
            cfg::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("queue.regimes")
                .with_list_parse_key("sort.chunk_counts"),
        );

        let config: BenchConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.queue.validate()?;
        self.sort.validate()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.queue.producers, 2);
        assert_eq!(config.queue.consumers, 2);
        assert_eq!(config.queue.tasks_per_producer, 1000);
        assert_eq!(config.queue.regimes, Regime::ALL.to_vec());
        assert_eq!(config.queue.mutex_termination, MutexTermination::ObservedEmpty);
        assert_eq!(config.sort.chunk_counts, vec![2, 4, 8]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_chunk_count() {
        let mut config = BenchConfig::default();
        config.sort.chunk_counts = vec![2, 0];
        assert!(matches!(
            config.validate(),
            Err(BenchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_missing_producers_and_regimes() {
        let mut config = BenchConfig::default();
        config.queue.producers = 0;
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.queue.regimes.clear();
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.queue.max_threads = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trips_through_serde() {
        let mut config = BenchConfig::default();
        config.sort.seed = Some(7);
        config.queue.mutex_termination = MutexTermination::ProducersDone;
        config.queue.max_threads = Some(16);
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("mutex_termination = \"producers-done\""));
        let parsed: BenchConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn regime_names_are_kebab_case() {
        let names: Vec<_> = Regime::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, ["unsynchronized", "flag-gated", "mutex-gated"]);
    }
}
