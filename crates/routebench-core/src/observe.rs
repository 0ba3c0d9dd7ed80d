//! Observation recording: simulated per-tick outcomes and probe logs.
//!
//! Two sources feed the statistics aggregator. In simulated mode the
//! sweep appends one outcome per (flow, tick) from the reachability
//! checker. In live mode external probe processes append `.`/`x` symbols
//! to per-flow log files, and only their aggregate counts are read back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

/// Probe log symbol for a successful attempt.
pub const SUCCESS_SYMBOL: char = '.';
/// Probe log symbol for a failed attempt.
pub const FAIL_SYMBOL: char = 'x';

/// One pass/fail observation for a (flow, tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Fail,
}

/// Success/failure tallies for one flow or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub success: u64,
    pub fail: u64,
}

impl Counts {
    pub fn total(&self) -> u64 {
        self.success + self.fail
    }

    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::Fail => self.fail += 1,
        }
    }

    pub fn merge(&mut self, other: Counts) {
        self.success += other.success;
        self.fail += other.fail;
    }
}

/// Append-only per-flow observation sequences for one iteration.
///
/// Sequence position is the tick index; entries are never rewritten,
/// only appended and eventually aggregated. A new iteration starts from
/// a fresh log.
#[derive(Debug, Default)]
pub struct ObservationLog {
    per_flow: Vec<Vec<Outcome>>,
}

impl ObservationLog {
    pub fn new(flow_count: usize) -> Self {
        Self {
            per_flow: vec![Vec::new(); flow_count],
        }
    }

    /// Append one outcome for the given flow.
    pub fn record(&mut self, flow: usize, outcome: Outcome) {
        self.per_flow[flow].push(outcome);
    }

    /// Tallies per flow, in flow order.
    pub fn flow_counts(&self) -> Vec<Counts> {
        self.per_flow
            .iter()
            .map(|seq| {
                let mut counts = Counts::default();
                for &outcome in seq {
                    counts.add(outcome);
                }
                counts
            })
            .collect()
    }

    /// Aggregate tally across all flows.
    pub fn counts(&self) -> Counts {
        let mut total = Counts::default();
        for counts in self.flow_counts() {
            total.merge(counts);
        }
        total
    }
}

/// Source of externally observed per-flow outcome counts (live mode).
///
/// Abstracted so the whole-file rescan below can later be swapped for an
/// incremental tailer without touching the statistics aggregation.
pub trait ObservationCollector {
    /// Per-flow tallies, aligned with the iteration's flow order.
    fn collect(&mut self) -> anyhow::Result<Vec<Counts>>;
}

/// Re-reads whole per-flow probe logs on every collection pass.
///
/// Acceptable for small experiments; a probe log that does not exist yet
/// counts as zero observations, not an error. Characters other than the
/// two outcome symbols are ignored.
#[derive(Debug)]
pub struct ProbeLogCollector {
    paths: Vec<PathBuf>,
}

impl ProbeLogCollector {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl ObservationCollector for ProbeLogCollector {
    fn collect(&mut self) -> anyhow::Result<Vec<Counts>> {
        self.paths.iter().map(|p| read_symbol_counts(p)).collect()
    }
}

fn read_symbol_counts(path: &Path) -> anyhow::Result<Counts> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "probe log not written yet");
            return Ok(Counts::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading probe log {}", path.display()));
        }
    };

    let mut counts = Counts::default();
    for ch in text.chars() {
        match ch {
            SUCCESS_SYMBOL => counts.success += 1,
            FAIL_SYMBOL => counts.fail += 1,
            _ => {}
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static LOG_SEQ: AtomicU32 = AtomicU32::new(0);

    /// Unique scratch file path (pid + counter, parallel-safe).
    fn scratch_log(prefix: &str) -> PathBuf {
        let seq = LOG_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("rb_obs_{}_{}_{}", prefix, std::process::id(), seq))
    }

    #[test]
    fn log_is_append_only_and_aggregates() {
        let mut log = ObservationLog::new(2);
        log.record(0, Outcome::Success);
        log.record(0, Outcome::Fail);
        log.record(1, Outcome::Success);

        let per_flow = log.flow_counts();
        assert_eq!(per_flow[0], Counts { success: 1, fail: 1 });
        assert_eq!(per_flow[1], Counts { success: 1, fail: 0 });

        let total = log.counts();
        assert_eq!(total.success, 2);
        assert_eq!(total.fail, 1);
        assert_eq!(total.total(), 3);
    }

    #[test]
    fn collector_counts_symbols_and_ignores_noise() {
        let path = scratch_log("symbols");
        fs::write(&path, "..x.\nxx..\n???\n").unwrap();

        let mut collector = ProbeLogCollector::new(vec![path.clone()]);
        let counts = collector.collect().unwrap();
        assert_eq!(counts, vec![Counts { success: 5, fail: 3 }]);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_log_counts_as_zero_observations() {
        let path = scratch_log("missing");
        let mut collector = ProbeLogCollector::new(vec![path]);
        let counts = collector.collect().unwrap();
        assert_eq!(counts, vec![Counts::default()]);
    }

    #[test]
    fn collector_preserves_flow_order() {
        let first = scratch_log("first");
        let second = scratch_log("second");
        fs::write(&first, "...").unwrap();
        fs::write(&second, "xx").unwrap();

        let mut collector = ProbeLogCollector::new(vec![first.clone(), second.clone()]);
        let counts = collector.collect().unwrap();
        assert_eq!(counts[0], Counts { success: 3, fail: 0 });
        assert_eq!(counts[1], Counts { success: 0, fail: 2 });

        let _ = fs::remove_file(&first);
        let _ = fs::remove_file(&second);
    }
}
