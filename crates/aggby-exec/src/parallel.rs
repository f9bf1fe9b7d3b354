//! Batch-parallel aggregation on a `WorkerPool`.
//!
//! Immutable accumulation folds every batch into a private partial map and
//! reduces the partials pairwise with `merge_partials`; no locks are involved.
//! In-place accumulation either feeds one `LockedAccumulators` map shared by
//! all workers, or (`*_reduce`) mutates private per-batch accumulators that are
//! combined through `Merge` afterwards. Either way a batch is processed by one worker start to finish, and
//! the call returns only after every batch is done. A panicking batch aborts
//! the whole run; no partial result escapes.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

use rayon::prelude::*;

use aggby_ops::{aggregate_by, aggregate_in_place_by, merge_partials, LazyAggregation, Merge};

use crate::error::ExecError;
use crate::metrics;
use crate::pool::WorkerPool;
use crate::schedule::{plan_batches, BatchPlan};
use crate::shared::LockedAccumulators;

/// Shard count used when the caller does not pick one.
pub const DEFAULT_LOCK_SHARDS: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct ParallelAggregator<'p> {
    pool: &'p WorkerPool,
    batch_size: NonZeroUsize,
    lock_shards: usize,
}

impl<'p> ParallelAggregator<'p> {
    pub fn new(pool: &'p WorkerPool, batch_size: usize) -> Result<Self, ExecError> {
        Ok(Self {
            pool,
            batch_size: crate::schedule::batch_size(batch_size)?,
            lock_shards: DEFAULT_LOCK_SHARDS,
        })
    }

    pub fn with_lock_shards(mut self, shards: usize) -> Self {
        self.lock_shards = shards.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    pub fn plan(&self, records: usize) -> BatchPlan {
        plan_batches(records, self.batch_size)
    }

    /// Parallel eager fold with immutable accumulators.
    pub fn aggregate_by<R, K, A, KF, ZF, AF>(
        &self,
        records: &[R],
        key_fn: KF,
        zero: ZF,
        add: AF,
    ) -> HashMap<K, A>
    where
        R: Sync,
        K: Eq + Hash + Send,
        A: Merge + Send,
        KF: Fn(&R) -> K + Sync,
        ZF: Fn() -> A + Sync,
        AF: Fn(&A, &R) -> A + Sync,
    {
        let plan = self.plan(records.len());
        self.pool.install(|| {
            plan.batches
                .par_iter()
                .map(|batch| {
                    crate::fail_point!("panic_batch_fold");
                    let slice = &records[batch.range.clone()];
                    let partial = aggregate_by(slice, &key_fn, &zero, &add);
                    metrics::record_batch(batch.id, slice.len(), partial.len());
                    partial
                })
                .reduce(HashMap::new, merge_partials)
        })
    }

    /// Parallel eager aggregation with in-place accumulators behind per-key locks.
    pub fn aggregate_in_place_by<R, K, A, KF, FF, UF>(
        &self,
        records: &[R],
        key_fn: KF,
        factory: FF,
        accept: UF,
    ) -> HashMap<K, A>
    where
        R: Sync,
        K: Eq + Hash + Send + Sync,
        A: Send,
        KF: Fn(&R) -> K + Sync,
        FF: Fn() -> A + Sync,
        UF: Fn(&mut A, &R) + Sync,
    {
        let plan = self.plan(records.len());
        let shared = LockedAccumulators::new(self.lock_shards);
        self.pool.install(|| {
            plan.batches.par_iter().for_each(|batch| {
                crate::fail_point!("panic_batch_accept");
                let slice = &records[batch.range.clone()];
                for record in slice {
                    shared.accept_with(key_fn(record), &factory, |acc| accept(acc, record));
                }
                metrics::record_batch(batch.id, slice.len(), 0);
            })
        });
        shared.into_map()
    }

    /// Parallel eager in-place aggregation without shared state: each batch
    /// updates its own accumulators, then partials are combined pairwise.
    pub fn aggregate_in_place_by_reduce<R, K, A, KF, FF, UF>(
        &self,
        records: &[R],
        key_fn: KF,
        factory: FF,
        accept: UF,
    ) -> HashMap<K, A>
    where
        R: Sync,
        K: Eq + Hash + Send,
        A: Merge + Send,
        KF: Fn(&R) -> K + Sync,
        FF: Fn() -> A + Sync,
        UF: Fn(&mut A, &R) + Sync,
    {
        let plan = self.plan(records.len());
        self.pool.install(|| {
            plan.batches
                .par_iter()
                .map(|batch| {
                    crate::fail_point!("panic_batch_reduce");
                    let slice = &records[batch.range.clone()];
                    let partial = aggregate_in_place_by(slice, &key_fn, &factory, &accept);
                    metrics::record_batch(batch.id, slice.len(), partial.len());
                    partial
                })
                .reduce(HashMap::new, merge_partials)
        })
    }

    /// Deferred `aggregate_by`: nothing is scheduled until the view is first read.
    pub fn aggregate_by_lazy<'a, R, K, A, KF, ZF, AF>(
        &self,
        records: &'a [R],
        key_fn: KF,
        zero: ZF,
        add: AF,
    ) -> LazyAggregation<'a, K, A>
    where
        'p: 'a,
        R: Sync,
        K: Eq + Hash + Send + 'a,
        A: Merge + Send + 'a,
        KF: Fn(&R) -> K + Send + Sync + 'a,
        ZF: Fn() -> A + Send + Sync + 'a,
        AF: Fn(&A, &R) -> A + Send + Sync + 'a,
    {
        let this = *self;
        LazyAggregation::new(move || this.aggregate_by(records, key_fn, zero, add))
    }

    /// Deferred `aggregate_in_place_by`.
    pub fn aggregate_in_place_by_lazy<'a, R, K, A, KF, FF, UF>(
        &self,
        records: &'a [R],
        key_fn: KF,
        factory: FF,
        accept: UF,
    ) -> LazyAggregation<'a, K, A>
    where
        'p: 'a,
        R: Sync,
        K: Eq + Hash + Send + Sync + 'a,
        A: Send + 'a,
        KF: Fn(&R) -> K + Send + Sync + 'a,
        FF: Fn() -> A + Send + Sync + 'a,
        UF: Fn(&mut A, &R) + Send + Sync + 'a,
    {
        let this = *self;
        LazyAggregation::new(move || this.aggregate_in_place_by(records, key_fn, factory, accept))
    }

    /// Deferred `aggregate_in_place_by_reduce`.
    pub fn aggregate_in_place_by_reduce_lazy<'a, R, K, A, KF, FF, UF>(
        &self,
        records: &'a [R],
        key_fn: KF,
        factory: FF,
        accept: UF,
    ) -> LazyAggregation<'a, K, A>
    where
        'p: 'a,
        R: Sync,
        K: Eq + Hash + Send + 'a,
        A: Merge + Send + 'a,
        KF: Fn(&R) -> K + Send + Sync + 'a,
        FF: Fn() -> A + Send + Sync + 'a,
        UF: Fn(&mut A, &R) + Send + Sync + 'a,
    {
        let this = *self;
        LazyAggregation::new(move || {
            this.aggregate_in_place_by_reduce(records, key_fn, factory, accept)
        })
    }
}
