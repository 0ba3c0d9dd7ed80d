//! End-to-end simulated sweeps over a small topology.
//!
//! Exercises the full driver: fault injection, reachability sampling,
//! aggregation, and per-iteration JSON persistence, all in-process with
//! the no-op platform.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use routebench_core::platform::NullPlatform;
use routebench_core::stats::RunStats;
use routebench_core::sweep::{ObservationMode, SweepConfig, SweepDriver};
use routebench_core::topology::Topology;

static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

/// Unique per-test results directory (pid + counter, parallel-safe).
fn scratch_dir(prefix: &str) -> PathBuf {
    let seq = DIR_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("rb_e2e_{}_{}_{}", prefix, std::process::id(), seq))
}

fn ring_topology() -> Topology {
    let nodes: Vec<String> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Topology::new(
        nodes,
        &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "a")],
    )
    .unwrap()
}

fn grid_config(results_dir: PathBuf) -> SweepConfig {
    SweepConfig {
        protocol: "dv".into(),
        seeds: vec![1, 2, 3],
        mttf_ticks: vec![50, 500],
        mttr_ticks: 10,
        flow_count: 6,
        ticks: 200,
        tick_interval: None,
        warmup: Duration::ZERO,
        report_every: 50,
        observation: ObservationMode::Simulated,
        results_dir,
    }
}

#[test]
fn sweep_produces_one_result_per_combination() {
    let dir = scratch_dir("grid");
    let mut topo = ring_topology();
    let cfg = grid_config(dir.clone());
    let expected_total = cfg.ticks * cfg.flow_count as u64;

    let mut driver = SweepDriver::new(cfg, NullPlatform);
    let results = driver.run(&mut topo).unwrap();

    // 3 seeds × 2 MTTF values, every key distinct, nothing overwritten
    assert_eq!(results.len(), 6);
    let keys: HashSet<_> = results.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys.len(), 6);

    for result in &results {
        assert_eq!(result.stats.total, result.stats.success + result.stats.fail);
        assert_eq!(result.stats.total, expected_total);

        // The persisted file round-trips to the in-memory stats
        let path = dir.join(result.key.file_name());
        let raw = fs::read_to_string(&path).unwrap();
        let persisted: RunStats = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, result.stats);
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn sweep_is_deterministic_for_a_seed_grid() {
    let dir_a = scratch_dir("det_a");
    let dir_b = scratch_dir("det_b");

    let mut run = |dir: PathBuf| {
        let mut topo = ring_topology();
        let mut driver = SweepDriver::new(grid_config(dir.clone()), NullPlatform);
        let results = driver.run(&mut topo).unwrap();
        let _ = fs::remove_dir_all(&dir);
        results
    };

    let first = run(dir_a);
    let second = run(dir_b);
    assert_eq!(first, second);
}

#[test]
fn cancellation_before_start_persists_nothing() {
    let dir = scratch_dir("cancel");
    let mut topo = ring_topology();
    let mut driver = SweepDriver::new(grid_config(dir.clone()), NullPlatform);
    driver.cancel_flag().store(true, Ordering::Relaxed);

    let results = driver.run(&mut topo).unwrap();
    assert!(results.is_empty());

    // The results directory may exist but must hold no summaries
    if let Ok(entries) = fs::read_dir(&dir) {
        assert_eq!(entries.count(), 0);
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn frequent_faults_lose_more_than_rare_faults() {
    // With MTTF=10 a ring of 5 links is almost always degraded; with
    // MTTF=100_000 over 200 ticks it rarely breaks at all. Comparing the
    // two extremes is stable across seeds.
    let dir = scratch_dir("contrast");
    let mut topo = ring_topology();
    let mut cfg = grid_config(dir.clone());
    cfg.seeds = vec![7];
    cfg.mttf_ticks = vec![10, 100_000];

    let mut driver = SweepDriver::new(cfg, NullPlatform);
    let results = driver.run(&mut topo).unwrap();
    assert_eq!(results.len(), 2);

    let frequent = results
        .iter()
        .find(|r| r.key.mttf_ticks == 10)
        .unwrap()
        .stats;
    let rare = results
        .iter()
        .find(|r| r.key.mttf_ticks == 100_000)
        .unwrap()
        .stats;
    assert!(
        frequent.fail_pc > rare.fail_pc,
        "mttf=10 ({}) should lose more than mttf=100000 ({})",
        frequent.fail_pc,
        rare.fail_pc
    );

    let _ = fs::remove_dir_all(&dir);
}
