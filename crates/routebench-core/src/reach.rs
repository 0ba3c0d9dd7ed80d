//! Reachability over the current topology snapshot.

use crate::topology::{NodeId, Topology};

/// Whether `source` can reach `target` over links that are not broken.
///
/// Iterative breadth-first walk with a visited set, so cyclic topologies
/// terminate and recursion depth is never a concern. Pure: the topology
/// snapshot is not mutated, and `reachable(t, n, n)` is always true.
pub fn reachable(topo: &Topology, source: NodeId, target: NodeId) -> bool {
    if source == target {
        return true;
    }

    // Adjacency over healthy links only.
    let mut adjacency: Vec<Vec<NodeId>> = vec![Vec::new(); topo.node_count()];
    for (id, link) in topo.links().iter().enumerate() {
        if topo.is_broken(id) {
            continue;
        }
        adjacency[link.a].push(link.b);
        adjacency[link.b].push(link.a);
    }

    let mut visited = vec![false; topo.node_count()];
    let mut frontier = vec![source];
    visited[source] = true;

    while let Some(node) = frontier.pop() {
        for &next in &adjacency[node] {
            if next == target {
                return true;
            }
            if !visited[next] {
                visited[next] = true;
                frontier.push(next);
            }
        }
    }
    false
}
