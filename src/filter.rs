use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::{EdgeSpec, Graph};

/// Produce the visible subgraph under `collapsed` flags.
///
/// A branch node with two or more direct children and a merge reachable from
/// every child defines a group. Collapsing the branch hides the whole group
/// plus the merge and synthesises bypass edges straight to the merge's
/// successors; collapsing a direct child hides just that child's run up to
/// (but excluding) the merge. Without any collapsed flag the input comes
/// back unchanged.
pub fn visible_subgraph(graph: &Graph) -> Graph {
    if graph.nodes.values().all(|node| !node.collapsed) {
        return graph.clone();
    }

    let mut outgoing: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    let mut incoming: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for edge in &graph.edges {
        if !graph.nodes.contains_key(&edge.source) || !graph.nodes.contains_key(&edge.target) {
            continue;
        }
        outgoing
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        incoming
            .entry(edge.target.as_str())
            .or_default()
            .push(edge.source.as_str());
    }

    let mut hidden: FxHashSet<&str> = FxHashSet::default();
    let mut bypass_pairs: Vec<(&str, &str)> = Vec::new();

    for (branch_id, branch) in &graph.nodes {
        let children = direct_children(branch_id, &outgoing);
        if children.len() < 2 {
            continue;
        }
        let Some(merge) = find_merge(graph, branch_id, &children, &outgoing) else {
            continue;
        };

        if branch.collapsed {
            let from_branch = reach(branch_id, &outgoing);
            let to_merge = reach(merge, &incoming);
            for &id in from_branch.intersection(&to_merge) {
                if id != branch_id.as_str() && id != merge {
                    hidden.insert(id);
                }
            }
            hidden.insert(merge);
            for &successor in outgoing.get(merge).into_iter().flatten() {
                bypass_pairs.push((branch_id.as_str(), successor));
            }
            continue;
        }

        for &child in &children {
            if !graph.nodes[child].collapsed {
                continue;
            }
            let from_child = reach(child, &outgoing);
            let to_merge = reach(merge, &incoming);
            for &id in from_child.intersection(&to_merge) {
                if id != merge {
                    hidden.insert(id);
                }
            }
            if child != merge {
                hidden.insert(child);
            }
        }
    }

    let mut visible = Graph::new();
    for (id, node) in &graph.nodes {
        if !hidden.contains(id.as_str()) {
            visible.insert_node(node.clone());
        }
    }
    for edge in &graph.edges {
        if !hidden.contains(edge.source.as_str()) && !hidden.contains(edge.target.as_str()) {
            visible.edges.push(edge.clone());
        }
    }

    let mut seen_pairs: FxHashSet<(String, String)> = visible
        .edges
        .iter()
        .map(|edge| (edge.source.clone(), edge.target.clone()))
        .collect();
    for (source, target) in bypass_pairs {
        if hidden.contains(source) || hidden.contains(target) {
            continue;
        }
        if !seen_pairs.insert((source.to_string(), target.to_string())) {
            continue;
        }
        visible.edges.push(EdgeSpec {
            id: format!("bypass-{source}-{target}"),
            source: source.to_string(),
            source_handle: Some("output-0".to_string()),
            target: target.to_string(),
            target_handle: Some("input-0".to_string()),
            label: None,
            routing: None,
            order: None,
        });
    }
    visible
}

fn direct_children<'a>(node: &str, outgoing: &FxHashMap<&str, Vec<&'a str>>) -> Vec<&'a str> {
    let mut children: Vec<&str> = Vec::new();
    for &child in outgoing.get(node).into_iter().flatten() {
        if child != node && !children.contains(&child) {
            children.push(child);
        }
    }
    children
}

/// Everything reachable from `start` by following `adjacency`, the start
/// node included. Run with the reversed adjacency this is co-reachability.
fn reach<'a>(start: &'a str, adjacency: &FxHashMap<&str, Vec<&'a str>>) -> FxHashSet<&'a str> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut queue: VecDeque<&str> = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(id) = queue.pop_front() {
        for &next in adjacency.get(id).into_iter().flatten() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// The nearest merge node reachable from every direct child of the branch.
fn find_merge<'a>(
    graph: &Graph,
    branch: &'a str,
    children: &[&'a str],
    outgoing: &FxHashMap<&str, Vec<&'a str>>,
) -> Option<&'a str> {
    let mut common: Option<FxHashSet<&str>> = None;
    for &child in children {
        let reachable = reach(child, outgoing);
        common = Some(match common {
            None => reachable,
            Some(set) => set.intersection(&reachable).copied().collect(),
        });
    }
    let common = common?;

    // Distance from the branch breaks ties toward the closest merge.
    let mut distance: FxHashMap<&str, usize> = FxHashMap::default();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    queue.push_back((branch, 0));
    distance.insert(branch, 0);
    while let Some((id, depth)) = queue.pop_front() {
        for &next in outgoing.get(id).into_iter().flatten() {
            if !distance.contains_key(next) {
                distance.insert(next, depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }

    common
        .into_iter()
        .filter(|id| graph.nodes.get(*id).is_some_and(|node| node.is_merge))
        .filter(|id| *id != branch)
        .min_by_key(|id| (distance.get(id).copied().unwrap_or(usize::MAX), *id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeSpec;

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
            source_handle: Some("output-0".to_string()),
            target: target.to_string(),
            target_handle: Some("input-0".to_string()),
            label: None,
            routing: None,
            order: None,
        }
    }

    /// p -> b -> {l, r} -> m -> e
    fn diamond() -> Graph {
        let mut graph = Graph::new();
        for id in ["p", "b", "l", "r", "e"] {
            graph.insert_node(node(id));
        }
        let mut merge = node("m");
        merge.is_merge = true;
        graph.insert_node(merge);
        graph.edges.push(edge("e0", "p", "b"));
        graph.edges.push(edge("e1", "b", "l"));
        graph.edges.push(edge("e2", "b", "r"));
        graph.edges.push(edge("e3", "l", "m"));
        graph.edges.push(edge("e4", "r", "m"));
        graph.edges.push(edge("e5", "m", "e"));
        graph
    }

    #[test]
    fn no_collapsed_flags_is_identity() {
        let graph = diamond();
        let visible = visible_subgraph(&graph);
        assert_eq!(visible.nodes.len(), graph.nodes.len());
        assert_eq!(visible.edges.len(), graph.edges.len());
        let ids: Vec<&str> = visible.edges.iter().map(|edge| edge.id.as_str()).collect();
        assert_eq!(ids, vec!["e0", "e1", "e2", "e3", "e4", "e5"]);
    }

    #[test]
    fn full_group_collapse_hides_group_and_merge() {
        let mut graph = diamond();
        graph.nodes.get_mut("b").unwrap().collapsed = true;
        let visible = visible_subgraph(&graph);

        for gone in ["l", "r", "m"] {
            assert!(!visible.nodes.contains_key(gone), "{gone} should be hidden");
        }
        for kept in ["p", "b", "e"] {
            assert!(visible.nodes.contains_key(kept), "{kept} should survive");
        }
        assert!(visible.edges.iter().any(|edge| edge.id == "e0"));
        let bypass = visible
            .edges
            .iter()
            .find(|edge| edge.id == "bypass-b-e")
            .expect("bypass edge missing");
        assert_eq!(bypass.source, "b");
        assert_eq!(bypass.target, "e");
    }

    #[test]
    fn per_branch_collapse_keeps_the_merge() {
        let mut graph = diamond();
        // Lengthen the left branch so something sits strictly between.
        graph.insert_node(node("l2"));
        graph.edges.retain(|edge| edge.id != "e3");
        graph.edges.push(edge("e3a", "l", "l2"));
        graph.edges.push(edge("e3b", "l2", "m"));
        graph.nodes.get_mut("l").unwrap().collapsed = true;

        let visible = visible_subgraph(&graph);
        assert!(!visible.nodes.contains_key("l"));
        assert!(!visible.nodes.contains_key("l2"));
        assert!(visible.nodes.contains_key("m"));
        assert!(visible.nodes.contains_key("r"));
        // The right branch still flows into the merge.
        assert!(visible.edges.iter().any(|edge| edge.id == "e4"));
        assert!(visible.edges.iter().any(|edge| edge.id == "e5"));
        // No bypass for a per-branch collapse.
        assert!(!visible.edges.iter().any(|edge| edge.id.starts_with("bypass")));
    }

    #[test]
    fn bypass_edges_dedup_by_pair() {
        let mut graph = diamond();
        // A second merge successor plus a duplicate m -> e edge.
        graph.edges.push(edge("e6", "m", "e"));
        graph.nodes.get_mut("b").unwrap().collapsed = true;
        let visible = visible_subgraph(&graph);
        let bypasses: Vec<&EdgeSpec> = visible
            .edges
            .iter()
            .filter(|edge| edge.id.starts_with("bypass"))
            .collect();
        assert_eq!(bypasses.len(), 1);
    }

    #[test]
    fn direct_branch_to_merge_edge_forms_a_group() {
        // b -> l -> m and b -> m directly: the group is just {l}.
        let mut graph = Graph::new();
        for id in ["b", "l", "e"] {
            graph.insert_node(node(id));
        }
        let mut merge = node("m");
        merge.is_merge = true;
        graph.insert_node(merge);
        graph.edges.push(edge("e0", "b", "l"));
        graph.edges.push(edge("e1", "l", "m"));
        graph.edges.push(edge("e2", "b", "m"));
        graph.edges.push(edge("e3", "m", "e"));
        graph.nodes.get_mut("b").unwrap().collapsed = true;

        let visible = visible_subgraph(&graph);
        assert!(!visible.nodes.contains_key("l"));
        assert!(!visible.nodes.contains_key("m"));
        assert!(visible.edges.iter().any(|edge| edge.id == "bypass-b-e"));
    }

    #[test]
    fn collapse_without_a_merge_is_ignored() {
        let mut graph = Graph::new();
        for id in ["b", "x", "y"] {
            graph.insert_node(node(id));
        }
        graph.edges.push(edge("e0", "b", "x"));
        graph.edges.push(edge("e1", "b", "y"));
        graph.nodes.get_mut("b").unwrap().collapsed = true;
        let visible = visible_subgraph(&graph);
        assert_eq!(visible.nodes.len(), 3);
        assert_eq!(visible.edges.len(), 2);
    }
}
