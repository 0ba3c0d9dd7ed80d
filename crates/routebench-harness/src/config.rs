//! Experiment file parsing and validation.
//!
//! A single TOML file declares the topology, the sweep grid, and (for
//! live runs) the collaborator binaries. Raw input is deserialized
//! permissively and then resolved into validated config structs; all
//! configuration errors surface here, before any iteration starts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use routebench_core::error::ConfigError;
use routebench_core::sweep::{ObservationMode, SweepConfig};
use routebench_core::topology::Topology;

use crate::live::LiveConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExperimentInput {
    pub protocol: String,
    /// `"simulated"` (default) or `"live"`.
    pub mode: Option<String>,
    pub nodes: Vec<String>,
    pub links: Vec<LinkInput>,
    pub seeds: Vec<u64>,
    pub mttf_ticks: Vec<u64>,
    pub mttr_ticks: Option<u64>,
    pub flow_count: Option<usize>,
    pub ticks: Option<u64>,
    /// 0 disables pacing.
    pub tick_interval_ms: Option<u64>,
    pub warmup_secs: Option<u64>,
    pub report_every: Option<u64>,
    pub results_dir: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub sync_group: Option<String>,
    /// Protocol name → routing daemon binary.
    pub routers: HashMap<String, PathBuf>,
    pub server_bin: Option<PathBuf>,
    pub probe_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkInput {
    pub a: String,
    pub b: String,
}

/// A fully validated experiment.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub nodes: Vec<String>,
    pub links: Vec<(String, String)>,
    pub sweep: SweepConfig,
    pub live: Option<LiveConfig>,
}

impl ExperimentInput {
    pub fn resolve(self) -> Result<Experiment, ConfigError> {
        if self.protocol.trim().is_empty() {
            return Err(ConfigError::Invalid("protocol name is required".into()));
        }
        if self.nodes.is_empty() {
            return Err(ConfigError::Invalid("at least one node is required".into()));
        }

        let live_mode = match self.mode.as_deref().unwrap_or("simulated") {
            "simulated" => false,
            "live" => true,
            other => {
                return Err(ConfigError::Invalid(format!("unknown mode {other:?}")));
            }
        };

        let mttr_ticks = self.mttr_ticks.unwrap_or(100);
        if mttr_ticks == 0 {
            return Err(ConfigError::ZeroMttr);
        }
        let mttf_ticks = if self.mttf_ticks.is_empty() {
            vec![1000]
        } else {
            self.mttf_ticks
        };
        if mttf_ticks.iter().any(|&mttf| mttf == 0) {
            return Err(ConfigError::ZeroMttf);
        }

        let seeds = if self.seeds.is_empty() {
            vec![0]
        } else {
            self.seeds
        };

        // Live runs pace ticks against wall-clock so external probes get
        // real time to observe the topology; simulation runs flat out.
        let tick_interval = match self.tick_interval_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None if live_mode => Some(Duration::from_secs(1)),
            None => None,
        };
        let warmup =
            Duration::from_secs(self.warmup_secs.unwrap_or(if live_mode { 20 } else { 0 }));

        let live = if live_mode {
            let router_bin = self
                .routers
                .get(&self.protocol)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownProtocol(self.protocol.clone()))?;
            let server_bin = self
                .server_bin
                .clone()
                .ok_or_else(|| ConfigError::Invalid("live mode requires server_bin".into()))?;
            let probe_bin = self
                .probe_bin
                .clone()
                .ok_or_else(|| ConfigError::Invalid("live mode requires probe_bin".into()))?;
            Some(LiveConfig {
                sync_group: self
                    .sync_group
                    .clone()
                    .unwrap_or_else(|| format!("/{}/sync", self.protocol)),
                router_bin,
                server_bin,
                probe_bin,
                work_dir: self
                    .work_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("/tmp/routebench")),
                ns_prefix: "rb".into(),
            })
        } else {
            None
        };

        let sweep = SweepConfig {
            protocol: self.protocol,
            seeds,
            mttf_ticks,
            mttr_ticks,
            flow_count: self.flow_count.unwrap_or(10),
            ticks: self.ticks.unwrap_or(600),
            tick_interval,
            warmup,
            report_every: self.report_every.unwrap_or(10),
            observation: if live_mode {
                ObservationMode::LiveProbes
            } else {
                ObservationMode::Simulated
            },
            results_dir: self.results_dir.unwrap_or_else(|| PathBuf::from("results")),
        };

        Ok(Experiment {
            nodes: self.nodes,
            links: self.links.into_iter().map(|l| (l.a, l.b)).collect(),
            sweep,
            live,
        })
    }
}

impl Experiment {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let parsed: ExperimentInput = toml::from_str(input)
            .map_err(|e| ConfigError::Invalid(format!("TOML parse error: {e}")))?;
        parsed.resolve()
    }

    pub fn build_topology(&self) -> Result<Topology, ConfigError> {
        Topology::new(self.nodes.clone(), &self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_simulated_experiment_gets_defaults() {
        let toml = r#"
            protocol = "dv"
            nodes = ["a", "b", "c"]

            [[links]]
            a = "a"
            b = "b"

            [[links]]
            a = "b"
            b = "c"
        "#;

        let exp = Experiment::from_toml_str(toml).unwrap();
        assert_eq!(exp.sweep.protocol, "dv");
        assert_eq!(exp.sweep.seeds, vec![0]);
        assert_eq!(exp.sweep.mttf_ticks, vec![1000]);
        assert_eq!(exp.sweep.mttr_ticks, 100);
        assert_eq!(exp.sweep.flow_count, 10);
        assert_eq!(exp.sweep.ticks, 600);
        assert_eq!(exp.sweep.tick_interval, None);
        assert_eq!(exp.sweep.warmup, Duration::ZERO);
        assert_eq!(exp.sweep.observation, ObservationMode::Simulated);
        assert!(exp.live.is_none());

        let topo = exp.build_topology().unwrap();
        assert_eq!(topo.node_count(), 3);
        assert_eq!(topo.link_count(), 2);
    }

    #[test]
    fn live_experiment_resolves_binaries_and_pacing() {
        let toml = r#"
            protocol = "dv"
            mode = "live"
            nodes = ["a", "b"]
            seeds = [1, 2]
            mttf_ticks = [500, 2000]
            mttr_ticks = 50
            server_bin = "/usr/local/bin/pingserver"
            probe_bin = "/usr/local/bin/ping-probe"

            [[links]]
            a = "a"
            b = "b"

            [routers]
            dv = "/usr/local/bin/dv-router"
            ls = "/usr/local/bin/ls-router"
        "#;

        let exp = Experiment::from_toml_str(toml).unwrap();
        assert_eq!(exp.sweep.observation, ObservationMode::LiveProbes);
        assert_eq!(exp.sweep.tick_interval, Some(Duration::from_secs(1)));
        assert_eq!(exp.sweep.warmup, Duration::from_secs(20));

        let live = exp.live.unwrap();
        assert_eq!(live.router_bin, PathBuf::from("/usr/local/bin/dv-router"));
        assert_eq!(live.sync_group, "/dv/sync");
        assert_eq!(live.work_dir, PathBuf::from("/tmp/routebench"));
    }

    #[test]
    fn live_mode_rejects_protocols_without_a_router() {
        let toml = r#"
            protocol = "ospf"
            mode = "live"
            nodes = ["a", "b"]
            server_bin = "/bin/srv"
            probe_bin = "/bin/probe"

            [routers]
            dv = "/bin/dv"
        "#;

        let err = Experiment::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProtocol(p) if p == "ospf"));
    }

    #[test]
    fn live_mode_requires_probe_binaries() {
        let toml = r#"
            protocol = "dv"
            mode = "live"
            nodes = ["a", "b"]

            [routers]
            dv = "/bin/dv"
        "#;

        assert!(matches!(
            Experiment::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_fault_parameters_are_rejected_at_parse_time() {
        let toml = r#"
            protocol = "dv"
            nodes = ["a"]
            mttf_ticks = [0]
        "#;
        assert!(matches!(
            Experiment::from_toml_str(toml),
            Err(ConfigError::ZeroMttf)
        ));

        let toml = r#"
            protocol = "dv"
            nodes = ["a"]
            mttr_ticks = 0
        "#;
        assert!(matches!(
            Experiment::from_toml_str(toml),
            Err(ConfigError::ZeroMttr)
        ));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let toml = r#"
            protocol = "dv"
            nodes = ["a"]
            mode = "hybrid"
        "#;
        assert!(matches!(
            Experiment::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_topology_is_rejected_when_built() {
        let toml = r#"
            protocol = "dv"
            nodes = ["a", "b"]

            [[links]]
            a = "a"
            b = "ghost"
        "#;
        let exp = Experiment::from_toml_str(toml).unwrap();
        assert!(matches!(
            exp.build_topology(),
            Err(ConfigError::UnknownNode(n)) if n == "ghost"
        ));
    }
}
