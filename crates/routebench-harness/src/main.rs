//! Routebench experiment runner.
//!
//! Loads a TOML experiment file, builds the topology, and drives the
//! (seed × MTTF) sweep, either as pure in-process simulation or against
//! an emulated network with real routing daemons and probes.

mod config;
mod live;
mod probe;
mod proc;
mod router;

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use routebench_core::platform::{NullPlatform, Platform};
use routebench_core::sweep::{ObservationMode, SweepDriver};
use routebench_core::topology::Topology;

use crate::config::Experiment;
use crate::live::LivePlatform;

/// Routing-resilience experiment sweep runner.
#[derive(Parser, Debug)]
#[command(
    name = "routebench",
    about = "Fault-injection sweeps over an emulated network"
)]
struct Cli {
    /// Experiment TOML file.
    #[arg(long, default_value = "experiment.toml")]
    experiment: PathBuf,

    /// Force pure-simulation mode regardless of the experiment file.
    #[arg(long, default_value_t = false)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let raw = std::fs::read_to_string(&cli.experiment)
        .with_context(|| format!("reading {}", cli.experiment.display()))?;
    let mut experiment = Experiment::from_toml_str(&raw)?;
    if cli.simulate {
        experiment.sweep.observation = ObservationMode::Simulated;
        experiment.sweep.tick_interval = None;
        experiment.live = None;
    }

    let topo = experiment.build_topology()?;
    tracing::info!(
        protocol = %experiment.sweep.protocol,
        nodes = topo.node_count(),
        links = topo.link_count(),
        seeds = experiment.sweep.seeds.len(),
        mttf_points = experiment.sweep.mttf_ticks.len(),
        "experiment loaded"
    );

    match experiment.live.take() {
        Some(live_cfg) => {
            let driver = SweepDriver::new(experiment.sweep, LivePlatform::new(live_cfg));
            run_sweep(driver, topo).await
        }
        None => {
            let driver = SweepDriver::new(experiment.sweep, NullPlatform);
            run_sweep(driver, topo).await
        }
    }
}

async fn run_sweep<P>(mut driver: SweepDriver<P>, mut topo: Topology) -> anyhow::Result<()>
where
    P: Platform + Send + 'static,
{
    // Ctrl-C flips the cancellation flag; the driver finishes its
    // current tick, discards the in-flight iteration, and returns.
    let cancel = driver.cancel_flag();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::warn!("shutdown requested; finishing current tick");
        cancel.store(true, Ordering::Relaxed);
    });

    let results = tokio::task::spawn_blocking(move || driver.run(&mut topo))
        .await
        .context("sweep task panicked")??;

    for result in &results {
        tracing::info!(
            protocol = %result.key.protocol,
            run = %result.key.run,
            mttf = result.key.mttf_ticks,
            mttr = result.key.mttr_ticks,
            total = result.stats.total,
            fail_pc = result.stats.fail_pc,
            "result"
        );
    }
    tracing::info!(results = results.len(), "sweep complete");
    Ok(())
}
