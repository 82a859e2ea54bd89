use rustc_hash::FxHashMap;

use crate::config::LayoutConfig;
use crate::ir::Graph;

mod ordering;
mod ranking;

/// Assign positions to every node of an acyclic graph: longest-path ranks,
/// median ordering with port-stable sibling order, then centred coordinate
/// assignment. Positions are written back as top-left corners. Behaviour on
/// cyclic input is unspecified (the ranks degrade, nothing panics).
pub fn assign_layout(graph: &mut Graph, config: &LayoutConfig) {
    for node in graph.nodes.values_mut() {
        if node.width <= 0.0 {
            node.width = config.node_width;
        }
        if node.height <= 0.0 {
            node.height = config.node_height;
        }
    }
    if graph.nodes.is_empty() {
        return;
    }

    let ranks = ranking::compute_ranks(&graph.nodes, &graph.edges);
    let max_rank = ranks.values().copied().max().unwrap_or(0);

    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for id in graph.nodes.keys() {
        buckets[ranks.get(id).copied().unwrap_or(0)].push(id.clone());
    }

    let node_order: FxHashMap<String, usize> = graph
        .nodes
        .keys()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();
    ordering::order_ranks(&mut buckets, &graph.edges, &node_order, config.order_passes);
    ordering::enforce_port_order(&mut buckets, graph);

    position_ranks(graph, &buckets, &ranks, config);
}

fn position_ranks(
    graph: &mut Graph,
    buckets: &[Vec<String>],
    ranks: &FxHashMap<String, usize>,
    config: &LayoutConfig,
) {
    let horizontal_gap = config.horizontal_gap.max(0.0);
    let vertical_gap = config.vertical_gap.max(0.0);
    let compact_gap = config.compact_vertical_gap.max(0.0).min(vertical_gap);

    let rank_widths: Vec<f32> = buckets
        .iter()
        .map(|bucket| {
            if bucket.is_empty() {
                return 0.0;
            }
            let total: f32 = bucket.iter().map(|id| graph.nodes[id].width).sum();
            total + horizontal_gap * (bucket.len() as f32 - 1.0)
        })
        .collect();
    let widest = rank_widths.iter().copied().fold(0.0f32, f32::max);

    // A rank gap stays wide when any labelled edge spans it; the label needs
    // the room. Compaction only ever shifts whole ranks, so it cascades.
    let mut labelled_gap = vec![false; buckets.len().saturating_sub(1)];
    for edge in &graph.edges {
        if edge.label.is_none() {
            continue;
        }
        let (Some(&from), Some(&to)) = (ranks.get(&edge.source), ranks.get(&edge.target)) else {
            continue;
        };
        for gap in labelled_gap.iter_mut().take(to).skip(from) {
            *gap = true;
        }
    }

    let mut y = 0.0f32;
    for (rank, bucket) in buckets.iter().enumerate() {
        let mut x = (widest - rank_widths[rank]) / 2.0;
        let mut rank_height = 0.0f32;
        for id in bucket {
            let Some(node) = graph.nodes.get_mut(id) else {
                continue;
            };
            node.x = x;
            node.y = y;
            x += node.width + horizontal_gap;
            rank_height = rank_height.max(node.height);
        }
        if rank + 1 < buckets.len() {
            let gap = if config.compact_unlabeled && !labelled_gap[rank] {
                compact_gap
            } else {
                vertical_gap
            };
            y += rank_height + gap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EdgeSpec, NodeSpec};

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

    fn edge(id: &str, source: &str, handle: usize, target: &str) -> EdgeSpec {
        EdgeSpec {
            id: id.to_string(),
            source: source.to_string(),
            source_handle: Some(format!("output-{handle}")),
            target: target.to_string(),
            target_handle: Some("input-0".to_string()),
            label: None,
            routing: None,
            order: None,
        }
    }

    fn branch_graph() -> Graph {
        let mut graph = Graph::new();
        for id in ["b", "x", "y", "z"] {
            graph.insert_node(node(id));
        }
        graph.edges.push(edge("e0", "b", 0, "x"));
        graph.edges.push(edge("e1", "b", 1, "y"));
        graph.edges.push(edge("e2", "b", 2, "z"));
        graph
    }

    #[test]
    fn children_line_up_left_to_right_by_handle() {
        let mut graph = branch_graph();
        assign_layout(&mut graph, &LayoutConfig::default());
        assert!(graph.nodes["x"].x < graph.nodes["y"].x);
        assert!(graph.nodes["y"].x < graph.nodes["z"].x);
        assert_eq!(graph.nodes["x"].y, graph.nodes["y"].y);
        assert_eq!(graph.nodes["y"].y, graph.nodes["z"].y);
    }

    #[test]
    fn deep_subtree_does_not_move_siblings() {
        let mut plain = branch_graph();
        assign_layout(&mut plain, &LayoutConfig::default());
        let y_before = plain.nodes["y"].y;

        let mut extended = branch_graph();
        for id in ["x1", "x2", "x3"] {
            extended.insert_node(node(id));
        }
        extended.edges.push(edge("c0", "x", 0, "x1"));
        extended.edges.push(edge("c1", "x1", 0, "x2"));
        extended.edges.push(edge("c2", "x2", 0, "x3"));
        assign_layout(&mut extended, &LayoutConfig::default());

        assert_eq!(extended.nodes["y"].y, y_before);
        assert_eq!(extended.nodes["y"].y, extended.nodes["z"].y);
        assert!(extended.nodes["x"].x < extended.nodes["y"].x);
        assert!(extended.nodes["y"].x < extended.nodes["z"].x);
    }

    #[test]
    fn ranks_are_separated_by_the_vertical_gap() {
        let mut graph = Graph::new();
        graph.insert_node(node("a"));
        graph.insert_node(node("b"));
        graph.edges.push(edge("e0", "a", 0, "b"));
        let config = LayoutConfig::default();
        assign_layout(&mut graph, &config);
        assert_eq!(graph.nodes["a"].y, 0.0);
        assert_eq!(graph.nodes["b"].y, 40.0 + config.vertical_gap);
    }

    #[test]
    fn compaction_pulls_unlabelled_ranks_closer() {
        let mut graph = Graph::new();
        for id in ["a", "b", "c"] {
            graph.insert_node(node(id));
        }
        let mut labelled = edge("e0", "a", 0, "b");
        labelled.label = Some("go".to_string());
        graph.edges.push(labelled);
        graph.edges.push(edge("e1", "b", 0, "c"));

        let config = LayoutConfig {
            compact_unlabeled: true,
            ..Default::default()
        };
        assign_layout(&mut graph, &config);
        // a->b carries a label and keeps the full gap; b->c compacts.
        assert_eq!(graph.nodes["b"].y, 40.0 + config.vertical_gap);
        assert_eq!(
            graph.nodes["c"].y,
            graph.nodes["b"].y + 40.0 + config.compact_vertical_gap
        );
    }

    #[test]
    fn unmeasured_nodes_get_fallback_dimensions() {
        let mut graph = Graph::new();
        let mut bare = node("a");
        bare.width = 0.0;
        bare.height = 0.0;
        graph.insert_node(bare);
        let config = LayoutConfig::default();
        assign_layout(&mut graph, &config);
        assert_eq!(graph.nodes["a"].width, config.node_width);
        assert_eq!(graph.nodes["a"].height, config.node_height);
    }
}
