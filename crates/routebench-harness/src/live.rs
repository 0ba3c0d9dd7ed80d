//! Live-experiment platform: emulated network plus external processes.
//!
//! Implements the core [`Platform`] seam by provisioning an [`EmuNet`]
//! for the topology, launching one routing daemon and one ping server
//! per node plus one probe per flow, mirroring link loss transitions
//! onto the emulated interfaces, and collecting the probes' symbol logs
//! at aggregation time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use routebench_core::flows::Flow;
use routebench_core::observe::{Counts, ObservationCollector, ProbeLogCollector};
use routebench_core::platform::Platform;
use routebench_core::topology::{LinkId, Topology};
use routebench_emu::net::EmuNet;

use crate::probe::{probe_log_path, probe_prefix, server_log_path, server_prefix};
use crate::proc::{with_retries, ProcSet};
use crate::router::{router_log_path, write_router_config, NeighborLink, RouterConfig};

/// Binaries and paths for one live experiment.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Sync group handed to every routing daemon, e.g. `/dv/sync`.
    pub sync_group: String,
    /// Routing daemon for the protocol under test.
    pub router_bin: PathBuf,
    /// Ping server binary, one instance per node.
    pub server_bin: PathBuf,
    /// Probe binary, one instance per flow.
    pub probe_bin: PathBuf,
    /// Per-node config payloads and collaborator logs live here.
    pub work_dir: PathBuf,
    /// Namespace name prefix; keep it short, interface names are capped
    /// at 15 characters.
    pub ns_prefix: String,
}

pub struct LivePlatform {
    config: LiveConfig,
    net: Option<EmuNet>,
    routers: ProcSet,
    servers: ProcSet,
    probes: ProcSet,
}

impl LivePlatform {
    pub fn new(config: LiveConfig) -> Self {
        Self {
            config,
            net: None,
            routers: ProcSet::new(),
            servers: ProcSet::new(),
            probes: ProcSet::new(),
        }
    }

    /// Spawn a collaborator inside a node's namespace.
    fn spawn_in_ns(
        procs: &mut ProcSet,
        name: &str,
        ns: &str,
        binary: &str,
        arg: &str,
        log_path: &Path,
    ) -> Result<()> {
        procs
            .spawn(
                name,
                Path::new("sudo"),
                &["ip", "netns", "exec", ns, binary, arg],
                log_path,
            )
            .with_context(|| format!("launching {name}"))
    }
}

impl Platform for LivePlatform {
    fn start(&mut self, topo: &Topology, flows: &[Flow]) -> Result<()> {
        let net = EmuNet::build(&self.config.ns_prefix, topo)?;
        let work_dir = self.config.work_dir.clone();
        let router_bin = self.config.router_bin.to_string_lossy().into_owned();
        let server_bin = self.config.server_bin.to_string_lossy().into_owned();
        let probe_bin = self.config.probe_bin.to_string_lossy().into_owned();

        for node in 0..topo.node_count() {
            let name = topo.node_name(node).to_string();
            let ns = net.node(node).name.clone();

            let links = net
                .neighbors(topo, node)
                .into_iter()
                .map(|n| NeighborLink {
                    local: n.local_addr,
                    peer: n.peer_addr,
                    peer_name: n.peer_name,
                })
                .collect();
            let payload = RouterConfig {
                sync: self.config.sync_group.clone(),
                name: name.clone(),
                links,
            };
            let cfg_path = write_router_config(&work_dir, &payload)?;
            let cfg_str = cfg_path.to_string_lossy().into_owned();

            Self::spawn_in_ns(
                &mut self.routers,
                &format!("router-{name}"),
                &ns,
                &router_bin,
                &cfg_str,
                &router_log_path(&work_dir, &name),
            )?;
            Self::spawn_in_ns(
                &mut self.servers,
                &format!("pingserver-{name}"),
                &ns,
                &server_bin,
                &server_prefix(&name),
                &server_log_path(&work_dir, &name),
            )?;
        }

        for flow in flows {
            let source = topo.node_name(flow.source).to_string();
            let target = topo.node_name(flow.target).to_string();
            let ns = net.node(flow.source).name.clone();
            tracing::debug!(flow = %flow.label(topo), "launching probe");
            Self::spawn_in_ns(
                &mut self.probes,
                &format!("probe-{source}-{target}"),
                &ns,
                &probe_bin,
                &probe_prefix(&target),
                &probe_log_path(&work_dir, &source, &target),
            )?;
        }

        tracing::info!(
            routers = self.routers.len(),
            servers = self.servers.len(),
            probes = self.probes.len(),
            "collaborators launched"
        );
        self.net = Some(net);
        Ok(())
    }

    fn apply_link_loss(&mut self, topo: &Topology, link: LinkId, loss_percent: f64) -> Result<()> {
        let net = self.net.as_ref().context("platform not started")?;
        with_retries("apply link loss", 3, Duration::from_millis(500), || {
            net.set_link_loss(topo, link, loss_percent)
        })
    }

    fn check(&mut self) -> Result<()> {
        self.routers.check()?;
        self.servers.check()?;
        self.probes.check()?;
        Ok(())
    }

    fn collect(&mut self, topo: &Topology, flows: &[Flow]) -> Result<Option<Vec<Counts>>> {
        let paths = flows
            .iter()
            .map(|flow| {
                probe_log_path(
                    &self.config.work_dir,
                    topo.node_name(flow.source),
                    topo.node_name(flow.target),
                )
            })
            .collect();
        let mut collector = ProbeLogCollector::new(paths);
        Ok(Some(collector.collect()?))
    }

    fn stop(&mut self) -> Result<()> {
        self.probes.stop();
        self.routers.stop();
        self.servers.stop();
        // Dropping the emulated network deletes its namespaces
        self.net = None;
        Ok(())
    }
}
