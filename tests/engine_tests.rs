//! End-to-end runs through `Engine`: setup, every mode, verification, teardown.

use aggby_core::config::{AggConfig, ConfigOverrides};
use aggby_core::generate::PositionGenerator;
use aggby_core::hash::digest_entries;
use aggby_core::mode::{AccumulationStyle, ExecMode};
use aggby_core::position::Grouping;
use aggby_exec::{Engine, ExecError};
use aggby_ops::verify_maps_equal;

fn config(threads: usize, batch: usize) -> AggConfig {
    AggConfig {
        parallelism: Some(threads),
        batch_size: Some(batch),
        seed: Some(2024),
        ..AggConfig::default()
    }
}

#[test]
fn every_grouping_mode_and_style_is_verified() {
    let positions = PositionGenerator::new(Some(2024)).generate(30_000);
    let engine = Engine::new(config(4, 1_000)).unwrap();
    for grouping in Grouping::ALL {
        for style in AccumulationStyle::ALL {
            let reports = engine
                .compare_modes(&positions, grouping, style, &ExecMode::ALL)
                .unwrap();
            let modes: Vec<_> = reports.iter().map(|r| r.outcome.manifest.mode).collect();
            assert_eq!(modes, ExecMode::ALL.to_vec());
            for r in &reports {
                let m = &r.outcome.manifest;
                assert_eq!(m.records, 30_000);
                assert_eq!(m.grouping, grouping);
                assert_eq!(m.style, style);
                assert_eq!(m.groups, r.outcome.result.len());
                let total: u64 = r.outcome.result.values().map(|s| s.count).sum();
                assert_eq!(total, 30_000);
                if m.mode.is_parallel() {
                    assert_eq!(m.batches, 30);
                    assert_eq!(m.workers, 4);
                } else {
                    assert_eq!(m.batches, 0);
                }
            }
        }
    }
    engine.shutdown().unwrap();
}

#[test]
fn immutable_and_in_place_styles_agree() {
    let positions = PositionGenerator::new(Some(9)).generate(10_000);
    let engine = Engine::new(config(3, 500)).unwrap();
    let immutable = engine
        .run(&positions, Grouping::Category, ExecMode::ParallelEager, AccumulationStyle::Immutable)
        .unwrap();
    let in_place = engine
        .run(&positions, Grouping::Category, ExecMode::ParallelLazy, AccumulationStyle::InPlace)
        .unwrap();
    verify_maps_equal(&immutable.result, &in_place.result, 1e-4).unwrap();
    engine.shutdown().unwrap();
}

#[test]
fn shuffled_iterations_agree_within_tolerance() {
    let mut generator = PositionGenerator::new(Some(77));
    let mut positions = generator.generate(20_000);
    let mut previous = None;
    for _ in 0..3 {
        generator.shuffle(&mut positions);
        let engine = Engine::new(config(4, 2_500)).unwrap();
        let out = engine
            .run(&positions, Grouping::Product, ExecMode::ParallelEager, AccumulationStyle::InPlace)
            .unwrap();
        engine.shutdown().unwrap();
        if let Some(prev) = previous.replace(out.result.clone()) {
            verify_maps_equal(&prev, &out.result, 1e-4).unwrap();
        }
    }
}

#[test]
fn manifest_digest_matches_result() {
    let positions = PositionGenerator::new(Some(1)).generate(2_000);
    let engine = Engine::new(config(2, 100)).unwrap();
    let out = engine
        .run(&positions, Grouping::Account, ExecMode::SerialLazy, AccumulationStyle::Immutable)
        .unwrap();
    assert_eq!(out.manifest.result_digest, Some(digest_entries(&out.result).unwrap()));
    assert_eq!(out.manifest.seed, Some(2024));
    assert!(out.manifest.finished_ms >= out.manifest.started_ms);
    engine.shutdown().unwrap();
}

#[test]
fn yaml_overrides_feed_the_engine() {
    let mut cfg = AggConfig::default();
    let doc = ConfigOverrides::from_yaml_str("parallelism: 2\nbatch_size: 64\nlock_shards: 4\n").unwrap();
    cfg.apply(&doc);
    let engine = Engine::new(cfg).unwrap();
    assert_eq!(engine.workers(), 2);
    assert_eq!(engine.batch_size_for(1_000).get(), 64);
    engine.shutdown().unwrap();
}

#[test]
fn invalid_configs_never_build_an_engine() {
    for cfg in [
        AggConfig { parallelism: Some(0), ..AggConfig::default() },
        AggConfig { lock_shards: 0, ..AggConfig::default() },
        AggConfig { sum_tolerance: f64::NAN, ..AggConfig::default() },
    ] {
        assert!(matches!(Engine::new(cfg), Err(ExecError::Config(_))));
    }
}

#[test]
fn empty_dataset_runs_in_every_mode() {
    let engine = Engine::new(config(2, 10)).unwrap();
    for style in AccumulationStyle::ALL {
        let reports = engine
            .compare_modes(&[], Grouping::Product, style, &ExecMode::ALL)
            .unwrap();
        assert!(reports.iter().all(|r| r.outcome.result.is_empty()));
        assert!(reports.iter().all(|r| r.identical_to_baseline));
    }
    engine.shutdown().unwrap();
}
