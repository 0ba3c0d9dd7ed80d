//! Flow registry: seeded sampling of distinct source→target pairs.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::RngExt as _;

use crate::error::InsufficientNodesError;
use crate::topology::{NodeId, Topology};

/// A monitored source → target reachability relationship.
///
/// Created once per iteration at setup and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flow {
    pub source: NodeId,
    pub target: NodeId,
}

impl Flow {
    /// `source->target` label used for log naming and reporting.
    pub fn label(&self, topo: &Topology) -> String {
        format!(
            "{}->{}",
            topo.node_name(self.source),
            topo.node_name(self.target)
        )
    }
}

/// Draw `count` distinct, non-reflexive flows uniformly from the node set.
///
/// Rejection sampling: reflexive or already-seen pairs are discarded and
/// redrawn, so the result is fully determined by the seed and node set.
/// Fails up front if `count` exceeds the number of distinct ordered pairs
/// (`n² − n`).
pub fn sample_flows(
    topo: &Topology,
    count: usize,
    rng: &mut StdRng,
) -> Result<Vec<Flow>, InsufficientNodesError> {
    let n = topo.node_count();
    let max = n * n.saturating_sub(1);
    if count > max {
        return Err(InsufficientNodesError {
            requested: count,
            nodes: n,
            max,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    let mut flows = Vec::with_capacity(count);
    while flows.len() < count {
        let flow = Flow {
            source: rng.random_range(0..n),
            target: rng.random_range(0..n),
        };
        if flow.source == flow.target {
            continue;
        }
        if seen.insert(flow) {
            flows.push(flow);
        }
    }
    Ok(flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn topology(n: usize) -> Topology {
        let nodes: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        Topology::new(nodes, &[] as &[(&str, &str)]).unwrap()
    }

    #[test]
    fn sample_returns_exact_count_of_distinct_pairs() {
        let topo = topology(6);
        let mut rng = StdRng::seed_from_u64(7);
        let flows = sample_flows(&topo, 12, &mut rng).unwrap();
        assert_eq!(flows.len(), 12);

        let unique: HashSet<_> = flows.iter().collect();
        assert_eq!(unique.len(), 12);
        for flow in &flows {
            assert_ne!(flow.source, flow.target);
        }
    }

    #[test]
    fn same_seed_same_flows() {
        let topo = topology(8);
        let a = sample_flows(&topo, 20, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = sample_flows(&topo, 20, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn saturating_count_yields_every_pair() {
        let topo = topology(3);
        let mut rng = StdRng::seed_from_u64(0);
        let flows = sample_flows(&topo, 6, &mut rng).unwrap();
        let unique: HashSet<_> = flows.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn over_saturating_count_is_rejected() {
        let topo = topology(3);
        let mut rng = StdRng::seed_from_u64(0);
        let err = sample_flows(&topo, 7, &mut rng).unwrap_err();
        assert_eq!(err.requested, 7);
        assert_eq!(err.nodes, 3);
        assert_eq!(err.max, 6);
    }

    #[test]
    fn zero_count_on_empty_node_set_is_fine() {
        let topo = topology(0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_flows(&topo, 0, &mut rng).unwrap().is_empty());
        assert!(sample_flows(&topo, 1, &mut rng).is_err());
    }

    #[test]
    fn label_uses_node_names() {
        let nodes: Vec<String> = vec!["src".into(), "dst".into()];
        let topo = Topology::new(nodes, &[] as &[(&str, &str)]).unwrap();
        let flow = Flow {
            source: 0,
            target: 1,
        };
        assert_eq!(flow.label(&topo), "src->dst");
    }
}
