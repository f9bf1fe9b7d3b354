#![forbid(unsafe_code)]
//! aggby-exec: worker pool, batch planning, parallel aggregation, run engine.
//!
//! Parallel runs split the input into contiguous batches; each batch is folded
//! by exactly one worker. Immutable accumulators are reduced from per-batch
//! partial maps. In-place accumulators share one map whose entries are locked
//! individually.

pub mod error;
pub mod failpoints;
pub mod metrics;
pub mod parallel;
pub mod pool;
pub mod runtime;
pub mod schedule;
pub mod shared;

pub use error::ExecError;
pub use parallel::ParallelAggregator;
pub use pool::WorkerPool;
pub use runtime::{Engine, ModeReport, RunOutcome};
pub use schedule::{choose_batch_size, plan_batches, Batch, BatchPlan};
pub use shared::LockedAccumulators;
