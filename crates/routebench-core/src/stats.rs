//! Statistics aggregation and the persisted result format.

use serde::{Deserialize, Serialize};

use crate::observe::Counts;

/// Aggregated outcome statistics for one sweep iteration.
///
/// This is exactly the persisted JSON object: `fail`, `success`, `total`,
/// `fail_pc`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub fail: u64,
    pub success: u64,
    pub total: u64,
    pub fail_pc: f64,
}

/// Aggregate counts into run statistics.
///
/// The denominator is floored at one so an empty observation set yields
/// 0% loss rather than an error or NaN. Mid-run snapshots and the final
/// summary both go through here, so the two always agree on the formula.
pub fn summarize(counts: Counts) -> RunStats {
    let total = counts.total();
    let fail_pc = round2(100.0 * counts.fail as f64 / total.max(1) as f64);
    RunStats {
        fail: counts.fail,
        success: counts.success,
        total,
        fail_pc,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Identity of one sweep iteration: protocol, run label, fault parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
    pub protocol: String,
    pub run: String,
    pub mttf_ticks: u64,
    pub mttr_ticks: u64,
}

impl RunKey {
    /// File name encoding the full key, e.g. `dv_seed3_mttf1000_mttr100.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_mttf{}_mttr{}.json",
            self.protocol, self.run, self.mttf_ticks, self.mttr_ticks
        )
    }
}

/// Final, immutable outcome of one sweep iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub key: RunKey,
    pub stats: RunStats,
}
