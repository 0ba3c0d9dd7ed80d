//! Seam to the consumed emulation platform and external processes.

use anyhow::Result;

use crate::flows::Flow;
use crate::observe::Counts;
use crate::topology::{LinkId, Topology};

/// External collaborators driven by the sweep: the network-emulation
/// platform, per-node routing daemons, and per-flow probes.
///
/// The sweep only requests effects and observes results; collaborators
/// run concurrently as independent processes and are never interpreted
/// beyond liveness. Pure-simulation runs use [`NullPlatform`].
pub trait Platform {
    /// Provision the emulated network and launch collaborators for one
    /// iteration. Called during INIT with the freshly sampled flows.
    fn start(&mut self, topo: &Topology, flows: &[Flow]) -> Result<()>;

    /// Mirror a link loss change onto both directions of the emulated
    /// link.
    fn apply_link_loss(&mut self, topo: &Topology, link: LinkId, loss_percent: f64) -> Result<()>;

    /// Surface unexpected collaborator exits. Called once per tick.
    fn check(&mut self) -> Result<()>;

    /// Externally observed per-flow tallies, aligned with `flows`.
    /// `None` if this platform produces no probe observations.
    fn collect(&mut self, topo: &Topology, flows: &[Flow]) -> Result<Option<Vec<Counts>>>;

    /// Tear down collaborators. Called during TEARDOWN, including after
    /// a failed iteration.
    fn stop(&mut self) -> Result<()>;
}

/// No-op platform for pure in-process simulation.
#[derive(Debug, Default)]
pub struct NullPlatform;

impl Platform for NullPlatform {
    fn start(&mut self, _topo: &Topology, _flows: &[Flow]) -> Result<()> {
        Ok(())
    }

    fn apply_link_loss(
        &mut self,
        _topo: &Topology,
        _link: LinkId,
        _loss_percent: f64,
    ) -> Result<()> {
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        Ok(())
    }

    fn collect(&mut self, _topo: &Topology, _flows: &[Flow]) -> Result<Option<Vec<Counts>>> {
        Ok(None)
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
