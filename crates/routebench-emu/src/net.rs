//! Emulated network mirroring a core topology.

use anyhow::{Context, Result};
use routebench_core::topology::{LinkId, NodeId, Topology};

use crate::loss::set_interface_loss;
use crate::netns::NodeNs;

/// Interfaces and addresses backing one emulated link.
///
/// Each link gets its own /24 out of 10.37.0.0/16: the `a` end is
/// `10.37.<link>.1`, the `b` end `10.37.<link>.2`.
#[derive(Debug, Clone)]
pub struct EmuLink {
    pub a_if: String,
    pub b_if: String,
    pub a_addr: String,
    pub b_addr: String,
}

/// A neighbor of a node over one emulated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    /// The node's own address on the shared link.
    pub local_addr: String,
    /// The neighbor's address on the shared link.
    pub peer_addr: String,
    /// The neighbor's node name.
    pub peer_name: String,
}

/// One namespace per node, one veth pair per link.
pub struct EmuNet {
    nodes: Vec<NodeNs>,
    links: Vec<EmuLink>,
}

impl EmuNet {
    /// Provision namespaces and veth links for the whole topology.
    ///
    /// `prefix` scopes namespace names (`<prefix>_<node>`); keep it
    /// short, interface names are limited to 15 characters.
    pub fn build(prefix: &str, topo: &Topology) -> Result<Self> {
        anyhow::ensure!(
            topo.link_count() <= 255,
            "the per-link /24 addressing scheme supports at most 255 links"
        );

        let mut nodes = Vec::with_capacity(topo.node_count());
        for name in topo.node_names() {
            let ns_name = format!("{prefix}_{name}");
            nodes.push(
                NodeNs::create(&ns_name)
                    .with_context(|| format!("creating namespace for node {name}"))?,
            );
        }

        let mut links = Vec::with_capacity(topo.link_count());
        for (id, link) in topo.links().iter().enumerate() {
            let emu = EmuLink {
                a_if: format!("l{id}a"),
                b_if: format!("l{id}b"),
                a_addr: format!("10.37.{id}.1"),
                b_addr: format!("10.37.{id}.2"),
            };
            nodes[link.a]
                .connect(
                    &nodes[link.b],
                    &emu.a_if,
                    &emu.b_if,
                    &format!("{}/24", emu.a_addr),
                    &format!("{}/24", emu.b_addr),
                )
                .with_context(|| format!("wiring link {}", topo.link_label(id)))?;
            links.push(emu);
        }

        tracing::debug!(
            nodes = nodes.len(),
            links = links.len(),
            "emulated network provisioned"
        );
        Ok(Self { nodes, links })
    }

    pub fn node(&self, id: NodeId) -> &NodeNs {
        &self.nodes[id]
    }

    pub fn link(&self, id: LinkId) -> &EmuLink {
        &self.links[id]
    }

    /// Apply a loss value to both directions of a link.
    pub fn set_link_loss(&self, topo: &Topology, id: LinkId, loss_percent: f64) -> Result<()> {
        let link = topo.link(id);
        let emu = &self.links[id];
        set_interface_loss(&self.nodes[link.a], &emu.a_if, loss_percent)
            .with_context(|| format!("loss on {} side a", topo.link_label(id)))?;
        set_interface_loss(&self.nodes[link.b], &emu.b_if, loss_percent)
            .with_context(|| format!("loss on {} side b", topo.link_label(id)))?;
        Ok(())
    }

    /// Every neighbor of `node`, one entry per incident link. Used to
    /// generate routing daemon config payloads.
    pub fn neighbors(&self, topo: &Topology, node: NodeId) -> Vec<Neighbor> {
        let mut out = Vec::new();
        for (id, link) in topo.links().iter().enumerate() {
            let emu = &self.links[id];
            if link.a == node {
                out.push(Neighbor {
                    local_addr: emu.a_addr.clone(),
                    peer_addr: emu.b_addr.clone(),
                    peer_name: topo.node_name(link.b).to_string(),
                });
            } else if link.b == node {
                out.push(Neighbor {
                    local_addr: emu.b_addr.clone(),
                    peer_addr: emu.a_addr.clone(),
                    peer_name: topo.node_name(link.a).to_string(),
                });
            }
        }
        out
    }
}
