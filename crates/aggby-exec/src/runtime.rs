//! Runtime: run one aggregation of positions in a chosen mode and style, and
//! emit a `RunManifest` describing it.
//!
//! The engine owns the worker pool for its whole life. Building an engine is
//! the per-run setup step and `shutdown` the teardown step; both are cheap
//! enough to repeat per iteration.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{SystemTime, UNIX_EPOCH};

use aggby_core::config::AggConfig;
use aggby_core::hash::digest_entries;
use aggby_core::manifest::RunManifest;
use aggby_core::mode::{AccumulationStyle, ExecMode};
use aggby_core::position::{GroupKey, Grouping, Position};
use aggby_core::stats::{MarketValueAccumulator, MarketValueStats};

use aggby_ops::{
    aggregate_by, aggregate_by_lazy, aggregate_in_place_by, aggregate_in_place_by_lazy,
    verify_maps_equal,
};

use crate::error::ExecError;
use crate::metrics;
use crate::parallel::ParallelAggregator;
use crate::pool::WorkerPool;
use crate::schedule::choose_batch_size;

/// Result of one run: the per-key statistics and the manifest describing how
/// they were produced. In-place runs are snapshotted into `MarketValueStats`.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub manifest: RunManifest,
    pub result: HashMap<GroupKey, MarketValueStats>,
}

/// One mode's entry in a cross-mode comparison.
#[derive(Debug, Clone)]
pub struct ModeReport {
    pub outcome: RunOutcome,
    /// Same result digest as the serial-eager baseline, i.e. bit-identical.
    pub identical_to_baseline: bool,
}

pub struct Engine {
    cfg: AggConfig,
    pool: WorkerPool,
}

impl Engine {
    pub fn new(cfg: AggConfig) -> Result<Self, ExecError> {
        cfg.validate()?;
        let pool = match cfg.parallelism {
            Some(n) => WorkerPool::new(n)?,
            None => WorkerPool::with_available_parallelism()?,
        };
        Ok(Self { cfg, pool })
    }

    pub fn config(&self) -> &AggConfig {
        &self.cfg
    }

    pub fn workers(&self) -> usize {
        self.pool.threads()
    }

    /// Batch size for an input of `records` positions: the configured one, or
    /// a size derived from the worker count.
    pub fn batch_size_for(&self, records: usize) -> NonZeroUsize {
        self.cfg
            .batch_size
            .and_then(NonZeroUsize::new)
            .unwrap_or_else(|| choose_batch_size(records, self.workers()))
    }

    fn parallel(&self, records: usize) -> Result<ParallelAggregator<'_>, ExecError> {
        Ok(
            ParallelAggregator::new(&self.pool, self.batch_size_for(records).get())?
                .with_lock_shards(self.cfg.lock_shards),
        )
    }

    /// Aggregate `positions` by `grouping` in one execution mode and style.
    pub fn run(
        &self,
        positions: &[Position],
        grouping: Grouping,
        mode: ExecMode,
        style: AccumulationStyle,
    ) -> Result<RunOutcome, ExecError> {
        let mut manifest = RunManifest::new(mode, style, grouping, positions.len(), now_millis())
            .with_seed(self.cfg.seed);

        let key_fn = move |p: &Position| grouping.key(p);
        let zero = || MarketValueStats::ZERO;
        let add = |acc: &MarketValueStats, p: &Position| acc.add(p);
        let accept = |acc: &mut MarketValueAccumulator, p: &Position| acc.accept(p);

        // Serial runs have no partials to combine, so both in-place styles
        // take the same path there.
        let result = match (mode, style) {
            (ExecMode::SerialEager, AccumulationStyle::Immutable) => {
                aggregate_by(positions, key_fn, zero, add)
            }
            (ExecMode::SerialEager, _) => snapshot(aggregate_in_place_by(
                positions,
                key_fn,
                MarketValueAccumulator::new,
                accept,
            )),
            (ExecMode::SerialLazy, AccumulationStyle::Immutable) => {
                aggregate_by_lazy(positions, key_fn, zero, add).into_map()
            }
            (ExecMode::SerialLazy, _) => snapshot(
                aggregate_in_place_by_lazy(positions, key_fn, MarketValueAccumulator::new, accept)
                    .into_map(),
            ),
            (ExecMode::ParallelEager, _) | (ExecMode::ParallelLazy, _) => {
                let par = self.parallel(positions.len())?;
                manifest = manifest.with_batching(
                    par.batch_size(),
                    par.plan(positions.len()).len(),
                    self.workers(),
                );
                match (mode.is_lazy(), style) {
                    (false, AccumulationStyle::Immutable) => {
                        par.aggregate_by(positions, key_fn, zero, add)
                    }
                    (false, AccumulationStyle::InPlace) => snapshot(par.aggregate_in_place_by(
                        positions,
                        key_fn,
                        MarketValueAccumulator::new,
                        accept,
                    )),
                    (true, AccumulationStyle::Immutable) => {
                        par.aggregate_by_lazy(positions, key_fn, zero, add).into_map()
                    }
                    (true, AccumulationStyle::InPlace) => snapshot(
                        par.aggregate_in_place_by_lazy(
                            positions,
                            key_fn,
                            MarketValueAccumulator::new,
                            accept,
                        )
                        .into_map(),
                    ),
                    (false, AccumulationStyle::InPlaceReduce) => {
                        snapshot(par.aggregate_in_place_by_reduce(
                            positions,
                            key_fn,
                            MarketValueAccumulator::new,
                            accept,
                        ))
                    }
                    (true, AccumulationStyle::InPlaceReduce) => snapshot(
                        par.aggregate_in_place_by_reduce_lazy(
                            positions,
                            key_fn,
                            MarketValueAccumulator::new,
                            accept,
                        )
                        .into_map(),
                    ),
                }
            }
        };

        let digest = digest_entries(&result)?;
        let manifest = manifest.finish(now_millis(), result.len(), Some(digest));
        metrics::record_run(&manifest);
        Ok(RunOutcome { manifest, result })
    }

    /// Run every mode in `modes` and check each against a serial-eager baseline
    /// within the configured sum tolerance.
    pub fn compare_modes(
        &self,
        positions: &[Position],
        grouping: Grouping,
        style: AccumulationStyle,
        modes: &[ExecMode],
    ) -> Result<Vec<ModeReport>, ExecError> {
        let baseline = self.run(positions, grouping, ExecMode::SerialEager, style)?;
        let mut reports = Vec::with_capacity(modes.len());
        for &mode in modes {
            let outcome = if mode == ExecMode::SerialEager {
                baseline.clone()
            } else {
                self.run(positions, grouping, mode, style)?
            };
            verify_maps_equal(&baseline.result, &outcome.result, self.cfg.sum_tolerance)
                .map_err(|source| ExecError::Verify { mode, source })?;
            let identical_to_baseline =
                outcome.manifest.result_digest == baseline.manifest.result_digest;
            reports.push(ModeReport {
                outcome,
                identical_to_baseline,
            });
        }
        Ok(reports)
    }

    /// Tear down the worker pool, waiting at most the configured timeout.
    pub fn shutdown(self) -> Result<(), ExecError> {
        let timeout = self.cfg.shutdown_timeout();
        self.pool.shutdown(timeout)
    }
}

fn snapshot<K: Eq + std::hash::Hash>(
    accs: HashMap<K, MarketValueAccumulator>,
) -> HashMap<K, MarketValueStats> {
    accs.into_iter().map(|(k, acc)| (k, acc.snapshot())).collect()
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggby_core::generate::PositionGenerator;

    fn engine(threads: usize, batch: usize) -> Engine {
        Engine::new(AggConfig {
            parallelism: Some(threads),
            batch_size: Some(batch),
            seed: Some(7),
            ..AggConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = AggConfig {
            batch_size: Some(0),
            ..AggConfig::default()
        };
        assert!(matches!(Engine::new(cfg), Err(ExecError::Config(_))));
    }

    #[test]
    fn serial_run_has_no_batching_in_manifest() {
        let positions = PositionGenerator::new(Some(1)).generate(200);
        let e = engine(2, 50);
        let out = e
            .run(&positions, Grouping::Category, ExecMode::SerialEager, AccumulationStyle::Immutable)
            .unwrap();
        assert_eq!(out.manifest.batch_size, None);
        assert_eq!(out.manifest.records, 200);
        assert_eq!(out.manifest.groups, out.result.len());
        assert_eq!(out.manifest.seed, Some(7));
        assert!(out.manifest.result_digest.is_some());
        e.shutdown().unwrap();
    }

    #[test]
    fn parallel_run_records_batching() {
        let positions = PositionGenerator::new(Some(1)).generate(205);
        let e = engine(3, 50);
        let out = e
            .run(&positions, Grouping::Account, ExecMode::ParallelEager, AccumulationStyle::InPlace)
            .unwrap();
        assert_eq!(out.manifest.batch_size, Some(50));
        assert_eq!(out.manifest.batches, 5);
        assert_eq!(out.manifest.workers, 3);
        let total: u64 = out.result.values().map(|s| s.count).sum();
        assert_eq!(total, 205);
        e.shutdown().unwrap();
    }

    #[test]
    fn lock_free_in_place_agrees_with_locked() {
        let positions = PositionGenerator::new(Some(12)).generate(3_000);
        let e = engine(4, 100);
        let locked = e
            .run(&positions, Grouping::Product, ExecMode::ParallelEager, AccumulationStyle::InPlace)
            .unwrap();
        for mode in [ExecMode::ParallelEager, ExecMode::ParallelLazy] {
            let reduced = e
                .run(&positions, Grouping::Product, mode, AccumulationStyle::InPlaceReduce)
                .unwrap();
            assert_eq!(reduced.manifest.style, AccumulationStyle::InPlaceReduce);
            assert_eq!(reduced.manifest.batches, 30);
            aggby_ops::verify_maps_equal(&locked.result, &reduced.result, 1e-4).unwrap();
        }
        e.shutdown().unwrap();
    }

    #[test]
    fn derived_batch_size_when_unset() {
        let e = Engine::new(AggConfig {
            parallelism: Some(2),
            batch_size: None,
            ..AggConfig::default()
        })
        .unwrap();
        assert_eq!(e.batch_size_for(80).get(), 10);
        e.shutdown().unwrap();
    }

    #[test]
    fn all_modes_agree_with_baseline() {
        let positions = PositionGenerator::new(Some(3)).generate(1_000);
        let e = engine(4, 64);
        for style in AccumulationStyle::ALL {
            let reports = e
                .compare_modes(&positions, Grouping::Product, style, &ExecMode::ALL)
                .unwrap();
            assert_eq!(reports.len(), 4, "{style}");
            assert!(reports[0].identical_to_baseline);
            // Serial lazy folds in the same order as serial eager.
            assert!(reports[1].identical_to_baseline);
        }
        e.shutdown().unwrap();
    }
}
