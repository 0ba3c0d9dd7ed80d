//! Experiment sweep driver.
//!
//! Runs the INIT → WARMUP → STEADY_TICKS → TEARDOWN → PERSISTED state
//! machine once per (seed, MTTF) combination, holding MTTR fixed, and
//! persists one JSON summary per iteration. A failed iteration is logged
//! with its sweep point and skipped; the sweep always attempts every
//! remaining combination.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::ConfigError;
use crate::fault::{FaultProcess, LinkTransition};
use crate::flows::{sample_flows, Flow};
use crate::observe::{Counts, ObservationLog, Outcome};
use crate::platform::Platform;
use crate::reach::reachable;
use crate::stats::{summarize, RunKey, RunResult, RunStats};
use crate::topology::Topology;

/// How per-flow outcomes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationMode {
    /// Evaluate reachability in-process on every tick.
    Simulated,
    /// Trust externally written probe logs, collected via the platform.
    LiveProbes,
}

/// Parameters for one sweep: the (seed × MTTF) grid plus shared settings.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Routing protocol under test; part of every result key.
    pub protocol: String,
    /// One iteration per (seed, MTTF) pair; run labels are seed-derived.
    pub seeds: Vec<u64>,
    pub mttf_ticks: Vec<u64>,
    /// Held fixed across the sweep.
    pub mttr_ticks: u64,
    /// Monitored flows sampled per iteration.
    pub flow_count: usize,
    /// Tick budget per iteration.
    pub ticks: u64,
    /// Real-time pacing between ticks; `None` runs ticks back-to-back.
    pub tick_interval: Option<Duration>,
    /// Fixed wait for external routing convergence before the first
    /// tick. A plain sleep, not an adaptive convergence check.
    pub warmup: Duration,
    /// Emit a statistics snapshot every this many ticks; 0 disables.
    pub report_every: u64,
    pub observation: ObservationMode,
    /// Directory receiving one JSON summary per iteration.
    pub results_dir: PathBuf,
}

impl SweepConfig {
    /// Validate fault parameters before any iteration starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mttr_ticks == 0 {
            return Err(ConfigError::ZeroMttr);
        }
        if self.mttf_ticks.iter().any(|&mttf| mttf == 0) {
            return Err(ConfigError::ZeroMttf);
        }
        Ok(())
    }
}

/// Top-level control loop over the configured sweep grid.
pub struct SweepDriver<P: Platform> {
    config: SweepConfig,
    platform: P,
    cancel: Arc<AtomicBool>,
}

impl<P: Platform> SweepDriver<P> {
    pub fn new(config: SweepConfig, platform: P) -> Self {
        Self {
            config,
            platform,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between ticks. Setting it discards the in-flight
    /// iteration and ends the sweep; results persisted for earlier
    /// iterations are untouched.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run every configured (seed, MTTF) combination against `topo`.
    pub fn run(&mut self, topo: &mut Topology) -> Result<Vec<RunResult>> {
        self.config.validate()?;
        fs::create_dir_all(&self.config.results_dir).with_context(|| {
            format!(
                "creating results dir {}",
                self.config.results_dir.display()
            )
        })?;

        let seeds = self.config.seeds.clone();
        let mttf_grid = self.config.mttf_ticks.clone();
        let mut results: BTreeMap<RunKey, RunResult> = BTreeMap::new();

        'sweep: for &seed in &seeds {
            for &mttf in &mttf_grid {
                if self.cancel.load(Ordering::Relaxed) {
                    tracing::warn!("sweep cancelled; stopping before next iteration");
                    break 'sweep;
                }

                let key = RunKey {
                    protocol: self.config.protocol.clone(),
                    run: format!("seed{seed}"),
                    mttf_ticks: mttf,
                    mttr_ticks: self.config.mttr_ticks,
                };
                if results.contains_key(&key) {
                    tracing::warn!(run = %key.run, mttf, "duplicate sweep point; skipping");
                    continue;
                }

                tracing::info!(
                    protocol = %key.protocol,
                    run = %key.run,
                    mttf,
                    mttr = key.mttr_ticks,
                    "sweep iteration starting"
                );

                match self.run_iteration(topo, seed, mttf) {
                    Ok(Some(stats)) => {
                        self.persist(&key, &stats)?;
                        results.insert(key.clone(), RunResult { key, stats });
                    }
                    Ok(None) => {
                        tracing::warn!(run = %key.run, mttf, "iteration cancelled; result discarded");
                        break 'sweep;
                    }
                    Err(e) => {
                        tracing::error!(
                            protocol = %key.protocol,
                            run = %key.run,
                            mttf,
                            mttr = key.mttr_ticks,
                            error = %format!("{e:#}"),
                            "sweep iteration failed; continuing with next combination"
                        );
                    }
                }
            }
        }

        Ok(results.into_values().collect())
    }

    /// One full iteration. `Ok(None)` means it was cancelled mid-run and
    /// must not be persisted.
    fn run_iteration(
        &mut self,
        topo: &mut Topology,
        seed: u64,
        mttf: u64,
    ) -> Result<Option<RunStats>> {
        // INIT
        let fault = FaultProcess::new(mttf, self.config.mttr_ticks)?;
        topo.reset();
        let mut rng = StdRng::seed_from_u64(seed);
        let flows = sample_flows(topo, self.config.flow_count, &mut rng)?;
        let mut log = ObservationLog::new(flows.len());
        if let Err(e) = self.platform.start(topo, &flows) {
            let _ = self.platform.stop();
            return Err(e).context("starting collaborators");
        }

        let ticks_outcome = self.warmup_and_ticks(topo, &fault, &flows, &mut log, &mut rng);

        // TEARDOWN runs regardless of how the tick loop ended.
        if let Err(e) = self.platform.stop() {
            tracing::warn!(error = %format!("{e:#}"), "collaborator teardown failed");
        }

        if !ticks_outcome? {
            return Ok(None);
        }

        // PERSISTED happens in the caller; here the final aggregation.
        let stats = summarize(self.observed_counts(topo, &flows, &log)?);
        Ok(Some(stats))
    }

    fn warmup_and_ticks(
        &mut self,
        topo: &mut Topology,
        fault: &FaultProcess,
        flows: &[Flow],
        log: &mut ObservationLog,
        rng: &mut StdRng,
    ) -> Result<bool> {
        // WARMUP — fixed delay standing in for routing convergence
        if !self.config.warmup.is_zero() {
            tracing::info!(secs = self.config.warmup.as_secs_f64(), "warmup wait");
            std::thread::sleep(self.config.warmup);
        }

        // STEADY_TICKS
        for tick in 0..self.config.ticks {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(false);
            }

            for transition in fault.tick(topo, rng) {
                match transition {
                    LinkTransition::Broke(id) => {
                        tracing::info!(link = %topo.link_label(id), tick, "link broken");
                    }
                    LinkTransition::Repaired(id) => {
                        tracing::info!(link = %topo.link_label(id), tick, "link repaired");
                    }
                }
                self.platform
                    .apply_link_loss(topo, transition.link(), transition.loss_percent())?;
            }

            if self.config.observation == ObservationMode::Simulated {
                for (idx, flow) in flows.iter().enumerate() {
                    let outcome = if reachable(topo, flow.source, flow.target) {
                        Outcome::Success
                    } else {
                        Outcome::Fail
                    };
                    log.record(idx, outcome);
                }
            }

            self.platform.check()?;

            if self.config.report_every > 0 && tick % self.config.report_every == 0 {
                let snapshot = summarize(self.observed_counts(topo, flows, log)?);
                tracing::info!(
                    tick,
                    total = snapshot.total,
                    fail_pc = snapshot.fail_pc,
                    "progress snapshot"
                );
            }

            if let Some(interval) = self.config.tick_interval {
                std::thread::sleep(interval);
            }
        }
        Ok(true)
    }

    /// Aggregate counts from whichever source the mode prescribes.
    fn observed_counts(
        &mut self,
        topo: &Topology,
        flows: &[Flow],
        log: &ObservationLog,
    ) -> Result<Counts> {
        match self.config.observation {
            ObservationMode::Simulated => Ok(log.counts()),
            ObservationMode::LiveProbes => {
                let per_flow = self
                    .platform
                    .collect(topo, flows)?
                    .context("live mode requires a platform that collects probe observations")?;
                let mut total = Counts::default();
                for counts in per_flow {
                    total.merge(counts);
                }
                Ok(total)
            }
        }
    }

    fn persist(&self, key: &RunKey, stats: &RunStats) -> Result<()> {
        let path = self.config.results_dir.join(key.file_name());
        let json = serde_json::to_string_pretty(stats)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            fail = stats.fail,
            success = stats.success,
            total = stats.total,
            fail_pc = stats.fail_pc,
            "iteration result persisted"
        );
        Ok(())
    }
}
