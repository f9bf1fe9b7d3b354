//! Per-run manifest for audit/replay.
//!
//! One manifest is emitted per (mode, style, grouping) run. With the recorded
//! seed and batch size the same dataset and the same partitioning can be rebuilt.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;
use crate::mode::{AccumulationStyle, ExecMode};
use crate::position::Grouping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Crate version string for provenance.
    pub engine_version: String,

    pub mode: ExecMode,
    pub style: AccumulationStyle,
    pub grouping: Grouping,

    /// Input records aggregated.
    pub records: usize,

    /// Records per batch; `None` for serial modes.
    pub batch_size: Option<usize>,
    pub batches: usize,
    pub workers: usize,

    /// Dataset seed, when the input was generated.
    pub seed: Option<u64>,

    /// Distinct keys in the result.
    pub groups: usize,

    /// Order-independent digest of the result mapping.
    pub result_digest: Option<Hash256>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(
        mode: ExecMode,
        style: AccumulationStyle,
        grouping: Grouping,
        records: usize,
        started_ms: u64,
    ) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            engine_version: crate::VERSION.to_string(),
            mode,
            style,
            grouping,
            records,
            batch_size: None,
            batches: 0,
            workers: 1,
            seed: None,
            groups: 0,
            result_digest: None,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn with_batching(mut self, batch_size: usize, batches: usize, workers: usize) -> Self {
        self.batch_size = Some(batch_size);
        self.batches = batches;
        self.workers = workers;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn finish(mut self, finished_ms: u64, groups: usize, digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.groups = groups;
        self.result_digest = digest;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
