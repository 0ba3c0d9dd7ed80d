//! In-memory topology model: named nodes and undirected lossy links.
//!
//! A link is "broken" purely as a function of its current loss value:
//! anything above [`BROKEN_THRESHOLD`] counts as fully down. There is no
//! other connectivity state. The fault process is the only mutator of
//! link loss during a run.

use crate::error::ConfigError;

/// Loss applied to a link when it fails.
pub const SATURATED_LOSS: f64 = 100.0;
/// Loss above this value marks a link as broken.
pub const BROKEN_THRESHOLD: f64 = 99.0;
/// Residual loss left on a repaired link (repaired, but not perfect).
pub const REPAIRED_LOSS: f64 = 0.0001;
/// Loss on a freshly initialized link.
pub const DEFAULT_LOSS: f64 = 0.0;

/// Index of a node within its [`Topology`].
pub type NodeId = usize;
/// Index of a link within its [`Topology`].
pub type LinkId = usize;

/// An undirected link between two nodes, with its current loss percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub a: NodeId,
    pub b: NodeId,
    pub loss_percent: f64,
}

/// The node/link universe for one experiment.
///
/// Nodes are immutable for the lifetime of a run; link loss values change
/// tick by tick.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<String>,
    links: Vec<Link>,
}

impl Topology {
    /// Build a topology from node names and `(endpoint, endpoint)` pairs.
    ///
    /// Links referencing an undeclared node, or pairing a node with
    /// itself, are rejected.
    pub fn new<S: AsRef<str>>(nodes: Vec<String>, links: &[(S, S)]) -> Result<Self, ConfigError> {
        let mut out = Vec::with_capacity(links.len());
        for (a, b) in links {
            let (a, b) = (a.as_ref(), b.as_ref());
            let ia = index_of(&nodes, a).ok_or_else(|| ConfigError::UnknownNode(a.into()))?;
            let ib = index_of(&nodes, b).ok_or_else(|| ConfigError::UnknownNode(b.into()))?;
            if ia == ib {
                return Err(ConfigError::SelfLink(a.into()));
            }
            out.push(Link {
                a: ia,
                b: ib,
                loss_percent: DEFAULT_LOSS,
            });
        }
        Ok(Self { nodes, links: out })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.nodes[id]
    }

    pub fn node_names(&self) -> &[String] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id]
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Restore every link to the healthy default loss.
    pub fn reset(&mut self) {
        for link in &mut self.links {
            link.loss_percent = DEFAULT_LOSS;
        }
    }

    /// Update a link's loss value. Idempotent.
    pub fn set_link_loss(&mut self, id: LinkId, loss_percent: f64) {
        self.links[id].loss_percent = loss_percent;
    }

    /// Whether the link is currently treated as fully down.
    pub fn is_broken(&self, id: LinkId) -> bool {
        self.links[id].loss_percent > BROKEN_THRESHOLD
    }

    /// Human-readable `a<->b` label for logging.
    pub fn link_label(&self, id: LinkId) -> String {
        let link = &self.links[id];
        format!("{}<->{}", self.nodes[link.a], self.nodes[link.b])
    }
}

fn index_of(nodes: &[String], name: &str) -> Option<usize> {
    nodes.iter().position(|n| n == name)
}
