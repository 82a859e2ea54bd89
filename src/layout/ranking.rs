use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::{EdgeSpec, NodeSpec};

/// Longest-path-from-source ranks via Kahn's topological BFS. Sources and
/// isolated nodes sit at rank 0; every forward edge adds at least one rank.
/// Acyclic input is a caller contract: on a cycle the remaining nodes are
/// drained in declaration order with their back-edges ignored, so the
/// function stays total but the ranks are unspecified.
pub(super) fn compute_ranks(
    nodes: &BTreeMap<String, NodeSpec>,
    edges: &[EdgeSpec],
) -> FxHashMap<String, usize> {
    let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    let mut indegree: FxHashMap<&str, usize> = FxHashMap::default();
    for id in nodes.keys() {
        indegree.insert(id, 0);
    }
    for edge in edges {
        if !nodes.contains_key(&edge.source) || !nodes.contains_key(&edge.target) {
            continue;
        }
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        *indegree.entry(edge.target.as_str()).or_default() += 1;
    }

    let order_key: FxHashMap<&str, usize> = nodes
        .keys()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for (id, &degree) in &indegree {
        if degree == 0 {
            ready.push(Reverse((order_key[id], *id)));
        }
    }

    let mut topo: Vec<&str> = Vec::with_capacity(nodes.len());
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    loop {
        while let Some(Reverse((_, id))) = ready.pop() {
            if !seen.insert(id) {
                continue;
            }
            topo.push(id);
            for &next in adjacency.get(id).into_iter().flatten() {
                if seen.contains(next) {
                    continue;
                }
                if let Some(degree) = indegree.get_mut(next) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.push(Reverse((order_key[next], next)));
                    }
                }
            }
        }
        if topo.len() >= nodes.len() {
            break;
        }
        // Cycle remnant: promote the earliest-declared unprocessed node to a
        // source and keep going.
        let Some(next) = nodes
            .keys()
            .map(String::as_str)
            .find(|id| !seen.contains(id))
        else {
            break;
        };
        ready.push(Reverse((order_key[next], next)));
    }

    let topo_index: FxHashMap<&str, usize> = topo
        .iter()
        .enumerate()
        .map(|(idx, &id)| (id, idx))
        .collect();

    let mut ranks: FxHashMap<String, usize> = FxHashMap::default();
    for &id in &topo {
        let rank = *ranks.entry(id.to_string()).or_insert(0);
        let from_idx = topo_index[id];
        for &next in adjacency.get(id).into_iter().flatten() {
            // Back-edges from a broken cycle never raise a rank.
            if topo_index.get(next).is_none_or(|&to_idx| to_idx <= from_idx) {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 40.0,
            is_merge: false,
            collapsed: false,
            label: None,
            handle_bounds: None,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> EdgeSpec {
        EdgeSpec {
            id: id.to_string(),
            source: source.to_string(),
            source_handle: None,
            target: target.to_string(),
            target_handle: None,
            label: None,
            routing: None,
            order: None,
        }
    }

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> (BTreeMap<String, NodeSpec>, Vec<EdgeSpec>) {
        let nodes = ids.iter().map(|id| (id.to_string(), node(id))).collect();
        let edges = links
            .iter()
            .enumerate()
            .map(|(idx, (source, target))| edge(&format!("e{idx}"), source, target))
            .collect();
        (nodes, edges)
    }

    #[test]
    fn chain_ranks_increase_monotonically() {
        let (nodes, edges) = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let ranks = compute_ranks(&nodes, &edges);
        assert_eq!(ranks["a"], 0);
        assert_eq!(ranks["b"], 1);
        assert_eq!(ranks["c"], 2);
    }

    #[test]
    fn rank_is_the_longest_path_not_the_shortest() {
        // d is reachable directly from a and through b-c; longest path wins.
        let (nodes, edges) = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );
        let ranks = compute_ranks(&nodes, &edges);
        assert_eq!(ranks["d"], 3);
    }

    #[test]
    fn siblings_share_a_rank_regardless_of_subtree_depth() {
        let (nodes, edges) = graph(
            &["b", "x", "y", "z", "x1", "x2", "x3"],
            &[
                ("b", "x"),
                ("b", "y"),
                ("b", "z"),
                ("x", "x1"),
                ("x1", "x2"),
                ("x2", "x3"),
            ],
        );
        let ranks = compute_ranks(&nodes, &edges);
        assert_eq!(ranks["x"], 1);
        assert_eq!(ranks["y"], 1);
        assert_eq!(ranks["z"], 1);
    }

    #[test]
    fn isolated_nodes_rank_zero() {
        let (nodes, edges) = graph(&["a", "lone"], &[]);
        let ranks = compute_ranks(&nodes, &edges);
        assert_eq!(ranks["lone"], 0);
        assert_eq!(ranks["a"], 0);
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let (nodes, mut edges) = graph(&["a", "b"], &[("a", "b")]);
        edges.push(edge("ghost", "a", "missing"));
        let ranks = compute_ranks(&nodes, &edges);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks["b"], 1);
    }
}
