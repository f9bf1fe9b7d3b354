//! Aggregation configuration that downstream crates can serialize/deserialize.
//!
//! Layering, lowest to highest priority: `Default` → `AggConfig::from_env()` →
//! a YAML override document (`ConfigOverrides`) → explicit CLI flags.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Records per batch used by the parallel modes when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Number of generated positions when no dataset size is configured.
pub const DEFAULT_DATASET_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggConfig {
    /// Records per batch for the parallel modes. `None` lets the exec layer
    /// derive one from the input length and worker count.
    pub batch_size: Option<usize>,

    /// Worker threads. `None` means available hardware parallelism.
    pub parallelism: Option<usize>,

    /// Upper bound on how long teardown waits for workers to exit.
    pub shutdown_timeout_ms: u64,

    /// Absolute tolerance on summed measures when comparing results across modes.
    pub sum_tolerance: f64,

    /// Positions to generate when no input file is given.
    pub dataset_size: usize,

    /// Optional seed for deterministic generation and shuffles.
    pub seed: Option<u64>,

    /// Shard count for the locked accumulator map used by in-place parallel runs.
    pub lock_shards: usize,
}

impl Default for AggConfig {
    fn default() -> Self {
        Self {
            batch_size: Some(DEFAULT_BATCH_SIZE),
            parallelism: None,
            shutdown_timeout_ms: 1_000,
            sum_tolerance: 1e-4,
            dataset_size: DEFAULT_DATASET_SIZE,
            seed: None,
            lock_shards: 64,
        }
    }
}

/// Partial configuration document; every present field overrides the base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub parallelism: Option<usize>,
    #[serde(default)]
    pub shutdown_timeout_ms: Option<u64>,
    #[serde(default)]
    pub sum_tolerance: Option<f64>,
    #[serde(default)]
    pub dataset_size: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub lock_shards: Option<usize>,
}

impl ConfigOverrides {
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(doc)?)
    }
}

impl AggConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `AGGBY_BATCH_SIZE`: records per parallel batch
    /// - `AGGBY_PARALLELISM`: worker thread count
    /// - `AGGBY_SHUTDOWN_TIMEOUT_MS`: bounded teardown wait
    /// - `AGGBY_SUM_TOLERANCE`: absolute tolerance on sums
    /// - `AGGBY_DATASET_SIZE`: generated positions
    /// - `AGGBY_SEED`: random seed
    /// - `AGGBY_LOCK_SHARDS`: shards in the locked accumulator map
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("AGGBY_BATCH_SIZE").and_then(|s| s.parse::<usize>().ok()) {
            cfg.batch_size = Some(v);
        }
        if let Some(v) = lookup("AGGBY_PARALLELISM").and_then(|s| s.parse::<usize>().ok()) {
            cfg.parallelism = Some(v);
        }
        if let Some(v) = lookup("AGGBY_SHUTDOWN_TIMEOUT_MS").and_then(|s| s.parse::<u64>().ok()) {
            cfg.shutdown_timeout_ms = v;
        }
        if let Some(v) = lookup("AGGBY_SUM_TOLERANCE").and_then(|s| s.parse::<f64>().ok()) {
            cfg.sum_tolerance = v;
        }
        if let Some(v) = lookup("AGGBY_DATASET_SIZE").and_then(|s| s.parse::<usize>().ok()) {
            cfg.dataset_size = v;
        }
        if let Some(v) = lookup("AGGBY_SEED").and_then(|s| s.parse::<u64>().ok()) {
            cfg.seed = Some(v);
        }
        if let Some(v) = lookup("AGGBY_LOCK_SHARDS").and_then(|s| s.parse::<usize>().ok()) {
            cfg.lock_shards = v;
        }

        cfg
    }

    pub fn apply(&mut self, doc: &ConfigOverrides) {
        if let Some(v) = doc.batch_size {
            self.batch_size = Some(v);
        }
        if let Some(v) = doc.parallelism {
            self.parallelism = Some(v);
        }
        if let Some(v) = doc.shutdown_timeout_ms {
            self.shutdown_timeout_ms = v;
        }
        if let Some(v) = doc.sum_tolerance {
            self.sum_tolerance = v;
        }
        if let Some(v) = doc.dataset_size {
            self.dataset_size = v;
        }
        if let Some(v) = doc.seed {
            self.seed = Some(v);
        }
        if let Some(v) = doc.lock_shards {
            self.lock_shards = v;
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == Some(0) {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.parallelism == Some(0) {
            return Err(Error::Config("parallelism must be at least 1".into()));
        }
        if self.lock_shards == 0 {
            return Err(Error::Config("lock_shards must be at least 1".into()));
        }
        if self.sum_tolerance.is_nan() || self.sum_tolerance < 0.0 {
            return Err(Error::Config(format!(
                "sum_tolerance must be a non-negative number, got {}",
                self.sum_tolerance
            )));
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.shutdown_timeout_ms)
    }
}
