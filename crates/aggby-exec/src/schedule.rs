//! Batch planning for the parallel modes.
//!
//! The input is cut into contiguous batches of `batch_size` records (the last
//! one may be short). A batch is the unit of work handed to a single worker;
//! it is never split further.

use std::num::NonZeroUsize;
use std::ops::Range;

use serde::Serialize;

use aggby_core::id::BatchId;

/// Aim for this many batches per worker so stragglers can be stolen.
const BATCHES_PER_WORKER: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub id: BatchId,
    pub range: Range<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPlan {
    pub records: usize,
    pub batch_size: usize,
    pub batches: Vec<Batch>,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Partition `records` positions into contiguous batches. Empty input yields
/// an empty plan.
pub fn plan_batches(records: usize, batch_size: NonZeroUsize) -> BatchPlan {
    let size = batch_size.get();
    let batches = (0..records)
        .step_by(size)
        .enumerate()
        .map(|(i, start)| Batch {
            id: BatchId::new(i as u64),
            range: start..(start + size).min(records),
        })
        .collect();
    BatchPlan {
        records,
        batch_size: size,
        batches,
    }
}

/// Derive a batch size when none is configured.
pub fn choose_batch_size(records: usize, workers: usize) -> NonZeroUsize {
    let target_batches = workers.max(1) * BATCHES_PER_WORKER;
    let size = records.div_ceil(target_batches).max(1);
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}

/// Validate a user-supplied batch size.
pub fn batch_size(size: usize) -> Result<NonZeroUsize, crate::ExecError> {
    NonZeroUsize::new(size).ok_or(crate::ExecError::InvalidBatchSize)
}
