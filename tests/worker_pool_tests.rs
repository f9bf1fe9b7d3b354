//! Worker pool lifecycle and batch partitioning.

use std::time::{Duration, Instant};

use aggby_exec::{choose_batch_size, plan_batches, ParallelAggregator, WorkerPool};

fn nz(n: usize) -> std::num::NonZeroUsize {
    std::num::NonZeroUsize::new(n).unwrap()
}

#[test]
fn shutdown_completes_within_timeout() {
    let pool = WorkerPool::new(4).unwrap();
    assert_eq!(pool.threads(), 4);
    let start = Instant::now();
    pool.shutdown(Duration::from_secs(5)).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn pool_is_reusable_across_runs_until_shutdown() {
    let pool = WorkerPool::new(2).unwrap();
    let par = ParallelAggregator::new(&pool, 3).unwrap();
    let data: Vec<(u8, f64)> = (0..30).map(|i| ((i % 3) as u8, 1.0)).collect();
    for _ in 0..5 {
        let got = par.aggregate_by(&data, |r: &(u8, f64)| r.0, || 0.0f64, |acc: &f64, r: &(u8, f64)| acc + r.1);
        assert_eq!(got.len(), 3);
        assert!(got.values().all(|&v| v == 10.0));
    }
    pool.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn each_iteration_gets_a_fresh_pool() {
    for _ in 0..3 {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.live_workers(), 3);
        pool.shutdown(Duration::from_secs(5)).unwrap();
    }
}

#[test]
fn available_parallelism_pool_has_workers() {
    let pool = WorkerPool::with_available_parallelism().unwrap();
    assert!(pool.threads() >= 1);
    pool.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn every_record_lands_in_exactly_one_batch() {
    for (len, size) in [(0, 5), (1, 5), (5, 5), (6, 5), (10_000, 10_000), (10_001, 10_000), (99, 1)] {
        let plan = plan_batches(len, nz(size));
        let mut next = 0;
        for batch in &plan.batches {
            assert_eq!(batch.range.start, next);
            assert!(!batch.is_empty());
            assert!(batch.len() <= size);
            next = batch.range.end;
        }
        assert_eq!(next, len);
        assert_eq!(plan.len(), len.div_ceil(size));
    }
}

#[test]
fn derived_batch_size_gives_several_batches_per_worker() {
    let size = choose_batch_size(1_000_000, 8);
    let plan = plan_batches(1_000_000, size);
    assert!(plan.len() >= 8);
    assert!(plan.len() <= 32);
}

#[test]
fn batch_size_does_not_change_counts() {
    let pool = WorkerPool::new(4).unwrap();
    let data: Vec<(u8, f64)> = (0..1_003).map(|i| ((i % 11) as u8, i as f64)).collect();
    for size in [1, 7, 100, 1_003, 50_000] {
        let par = ParallelAggregator::new(&pool, size).unwrap();
        let got = par.aggregate_in_place_by(&data, |r: &(u8, f64)| r.0, || 0u64, |n: &mut u64, _r: &(u8, f64)| *n += 1);
        assert_eq!(got.values().sum::<u64>(), 1_003, "batch size {size}");
        assert_eq!(got.len(), 11);
    }
}
