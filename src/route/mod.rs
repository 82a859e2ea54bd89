use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::config::RoutingConfig;
use crate::geometry::{Point, Rect, aligned};
use crate::ir::{EdgeSpec, Graph, NodeSpec, Side, handle_index};

mod grid;
mod path;
mod router;
mod separator;

pub use path::rounded_path;
pub use router::{RouteSpec, offset_point, route_edge};
pub use separator::spread_overlaps;

/// Final routing for one edge: the orthogonal polyline and its SVG path.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEdge {
    pub points: Vec<Point>,
    pub svg_path: String,
}

impl RoutedEdge {
    /// Signature of the S-shape fallback: exactly six points with an
    /// axis-aligned crossbar in the middle. Hosts may use this to detect
    /// degraded routes but should not build behaviour on it.
    pub fn is_fallback(&self) -> bool {
        self.points.len() == 6 && aligned(self.points[2], self.points[3])
    }
}

pub type RoutingResult = BTreeMap<String, RoutedEdge>;

/// Batch driver with a structural memoisation cache. Single-threaded by
/// design; callers that share a `Router` across threads must wrap it.
#[derive(Debug, Default)]
pub struct Router {
    cache: FxHashMap<u64, RoutingResult>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, graph: &Graph, config: &RoutingConfig) -> &RoutingResult {
        let key = memo_key(graph, config);
        self.cache
            .entry(key)
            .or_insert_with(|| route_batch(graph, config))
    }

    pub fn cached_batches(&self) -> usize {
        self.cache.len()
    }
}

/// Route every edge of the graph and separate shared corridors. Pure
/// function of its inputs; `Router::route` adds the cache on top.
pub fn route_batch(graph: &Graph, config: &RoutingConfig) -> RoutingResult {
    let rects: Vec<Rect> = graph.nodes.values().map(Rect::from_node).collect();

    let mut ids: Vec<&str> = Vec::with_capacity(graph.edges.len());
    let mut polylines: Vec<Vec<Point>> = Vec::with_capacity(graph.edges.len());
    let mut radii: Vec<f32> = Vec::with_capacity(graph.edges.len());

    for edge in &graph.edges {
        let (Some(source_node), Some(target_node)) = (
            graph.nodes.get(&edge.source),
            graph.nodes.get(&edge.target),
        ) else {
            continue;
        };

        let mut edge_config = match &edge.routing {
            Some(overrides) => config.with_overrides(overrides),
            None => config.clone(),
        };
        // The early-bend bias exists to make room for a label near the
        // source; unlabelled edges route without it.
        if edge.label.is_none() {
            edge_config.early_bend_bias = 0.0;
        }

        let (source, source_dir) = resolve_source_port(graph, source_node, edge, &edge_config);
        let (target, target_dir) =
            resolve_target_port(graph, source_node, target_node, edge, &edge_config);

        let obstacles: Vec<Rect> = rects
            .iter()
            .filter(|rect| rect.id != edge.source && rect.id != edge.target)
            .cloned()
            .collect();

        let spec = RouteSpec {
            source,
            source_dir,
            target,
            target_dir,
        };
        ids.push(&edge.id);
        polylines.push(route_edge(&spec, &obstacles, &edge_config));
        radii.push(edge_config.bend_radius);
    }

    spread_overlaps(&mut polylines, config.edge_separation);

    let mut result = RoutingResult::new();
    for ((id, points), bend_radius) in ids.into_iter().zip(polylines).zip(radii) {
        result.insert(
            id.to_string(),
            RoutedEdge {
                svg_path: rounded_path(&points, bend_radius),
                points,
            },
        );
    }
    result
}

fn resolve_source_port(
    graph: &Graph,
    node: &NodeSpec,
    edge: &EdgeSpec,
    config: &RoutingConfig,
) -> (Point, Side) {
    if let Some(handle_id) = edge.source_handle.as_deref()
        && let Some(measured) = node.measured_handle(handle_id, true)
    {
        return measured;
    }
    let index = edge
        .source_handle
        .as_deref()
        .and_then(handle_index)
        .unwrap_or(0);
    let count = graph.source_fan(&node.id);
    let side = config.source_dir;
    (node.port_position(side, index, count), side)
}

fn resolve_target_port(
    graph: &Graph,
    source_node: &NodeSpec,
    node: &NodeSpec,
    edge: &EdgeSpec,
    config: &RoutingConfig,
) -> (Point, Side) {
    if node.is_merge {
        let side = merge_entry_side(source_node, node);
        return (node.side_midpoint(side), side);
    }
    if let Some(handle_id) = edge.target_handle.as_deref()
        && let Some(measured) = node.measured_handle(handle_id, false)
    {
        return measured;
    }
    let index = edge
        .target_handle
        .as_deref()
        .and_then(handle_index)
        .unwrap_or(0);
    let count = graph.target_fan(&node.id);
    let side = config.target_dir;
    (node.port_position(side, index, count), side)
}

/// A merge node is a single-target circle: sources clearly to the left enter
/// from the left, clearly to the right from the right, and sources within
/// half the merge width of its centre come in through the top.
fn merge_entry_side(source_node: &NodeSpec, merge: &NodeSpec) -> Side {
    let (source_cx, _) = source_node.center();
    let (merge_cx, _) = merge.center();
    let threshold = merge.width / 2.0;
    if source_cx < merge_cx - threshold {
        Side::Left
    } else if source_cx > merge_cx + threshold {
        Side::Right
    } else {
        Side::Top
    }
}

fn memo_key(graph: &Graph, config: &RoutingConfig) -> u64 {
    let mut hasher = FxHasher::default();

    // Node map iterates in id order, edge ids are sorted explicitly, so the
    // key is stable under host-side reordering.
    for node in graph.nodes.values() {
        node.id.hash(&mut hasher);
        hash_f32(&mut hasher, node.x);
        hash_f32(&mut hasher, node.y);
        hash_f32(&mut hasher, node.width);
        hash_f32(&mut hasher, node.height);
        node.is_merge.hash(&mut hasher);
        node.collapsed.hash(&mut hasher);
        if let Some(bounds) = &node.handle_bounds {
            for handle in bounds.source.iter().chain(&bounds.target) {
                handle.id.hash(&mut hasher);
                hash_f32(&mut hasher, handle.x);
                hash_f32(&mut hasher, handle.y);
                hash_f32(&mut hasher, handle.width);
                hash_f32(&mut hasher, handle.height);
                handle.side.hash(&mut hasher);
            }
        }
    }

    let mut edges: Vec<&EdgeSpec> = graph.edges.iter().collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    for edge in edges {
        edge.id.hash(&mut hasher);
        edge.source.hash(&mut hasher);
        edge.source_handle.hash(&mut hasher);
        edge.target.hash(&mut hasher);
        edge.target_handle.hash(&mut hasher);
        edge.label.is_some().hash(&mut hasher);
        if let Some(overrides) = &edge.routing {
            hash_opt_f32(&mut hasher, overrides.padding);
            hash_opt_f32(&mut hasher, overrides.source_stub_length);
            hash_opt_f32(&mut hasher, overrides.target_stub_length);
            hash_opt_f32(&mut hasher, overrides.bend_penalty);
            hash_opt_f32(&mut hasher, overrides.early_bend_bias);
            hash_opt_f32(&mut hasher, overrides.bend_radius);
            overrides.source_dir.hash(&mut hasher);
            overrides.target_dir.hash(&mut hasher);
        }
    }

    hash_f32(&mut hasher, config.padding);
    hash_f32(&mut hasher, config.source_stub_length);
    hash_f32(&mut hasher, config.target_stub_length);
    hash_f32(&mut hasher, config.bend_penalty);
    hash_f32(&mut hasher, config.early_bend_bias);
    hash_f32(&mut hasher, config.edge_separation);
    hash_f32(&mut hasher, config.bend_radius);
    config.source_dir.hash(&mut hasher);
    config.target_dir.hash(&mut hasher);

    hasher.finish()
}

fn hash_f32(hasher: &mut FxHasher, value: f32) {
    value.to_bits().hash(hasher);
}

fn hash_opt_f32(hasher: &mut FxHasher, value: Option<f32>) {
    value.map(f32::to_bits).hash(hasher);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f32, y: f32, w: f32, h: f32) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            x,
            y,
            width: w,
            height: h,
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

    fn two_node_graph() -> Graph {
        let mut graph = Graph::new();
        graph.insert_node(node("a", 0.0, 0.0, 100.0, 40.0));
        graph.insert_node(node("b", 0.0, 200.0, 100.0, 40.0));
        graph.edges.push(edge("e1", "a", "b"));
        graph
    }

    #[test]
    fn straight_down_scenario() {
        let result = route_batch(&two_node_graph(), &RoutingConfig::default());
        let routed = &result["e1"];
        assert_eq!(
            routed.points,
            vec![(50.0, 40.0), (50.0, 60.0), (50.0, 180.0), (50.0, 200.0)]
        );
        assert_eq!(routed.svg_path, "M 50 40 L 50 200");
        assert!(!routed.is_fallback());
    }

    #[test]
    fn merge_entry_side_follows_source_centre() {
        let merge = {
            let mut m = node("m", 500.0, 500.0, 40.0, 40.0);
            m.is_merge = true;
            m
        };
        let left_source = node("s1", 250.0, 100.0, 100.0, 40.0);
        let right_source = node("s2", 650.0, 100.0, 100.0, 40.0);
        let centred_source = node("s3", 470.0, 100.0, 100.0, 40.0);

        assert_eq!(merge_entry_side(&left_source, &merge), Side::Left);
        assert_eq!(merge_entry_side(&right_source, &merge), Side::Right);
        assert_eq!(merge_entry_side(&centred_source, &merge), Side::Top);
        assert_eq!(merge.side_midpoint(Side::Left), (500.0, 520.0));
        assert_eq!(merge.side_midpoint(Side::Right), (540.0, 520.0));
        assert_eq!(merge.side_midpoint(Side::Top), (520.0, 500.0));
    }

    #[test]
    fn router_memoises_identical_batches() {
        let graph = two_node_graph();
        let config = RoutingConfig::default();
        let mut router = Router::new();
        let first = router.route(&graph, &config).clone();
        let second = router.route(&graph, &config).clone();
        assert_eq!(first, second);
        assert_eq!(router.cached_batches(), 1);
    }

    #[test]
    fn moving_a_node_invalidates_the_memo_key() {
        let mut graph = two_node_graph();
        let config = RoutingConfig::default();
        let before = memo_key(&graph, &config);
        graph.nodes.get_mut("b").unwrap().y = 260.0;
        assert_ne!(before, memo_key(&graph, &config));
    }

    #[test]
    fn memo_key_ignores_edge_declaration_order() {
        let mut graph = two_node_graph();
        graph.insert_node(node("c", 300.0, 0.0, 100.0, 40.0));
        graph.edges.push(edge("e2", "c", "b"));
        let config = RoutingConfig::default();
        let before = memo_key(&graph, &config);
        graph.edges.reverse();
        assert_eq!(before, memo_key(&graph, &config));
    }

    #[test]
    fn missing_endpoint_nodes_are_skipped() {
        let mut graph = two_node_graph();
        graph.edges.push(edge("ghost", "a", "nowhere"));
        let result = route_batch(&graph, &RoutingConfig::default());
        assert!(result.contains_key("e1"));
        assert!(!result.contains_key("ghost"));
    }

    #[test]
    fn source_ports_preserve_output_order() {
        let mut graph = Graph::new();
        graph.insert_node(node("a", 0.0, 0.0, 100.0, 40.0));
        graph.insert_node(node("x", -200.0, 200.0, 100.0, 40.0));
        graph.insert_node(node("y", 0.0, 200.0, 100.0, 40.0));
        graph.insert_node(node("z", 200.0, 200.0, 100.0, 40.0));
        for (idx, target) in ["x", "y", "z"].iter().enumerate() {
            graph.edges.push(EdgeSpec {
                id: format!("e{idx}"),
                source: "a".to_string(),
                source_handle: Some(format!("output-{idx}")),
                target: target.to_string(),
                target_handle: Some("input-0".to_string()),
                label: None,
                routing: None,
                order: None,
            });
        }
        let result = route_batch(&graph, &RoutingConfig::default());
        // Ports fan out at 8 px spacing about the bottom midpoint.
        assert_eq!(result["e0"].points[0], (42.0, 40.0));
        assert_eq!(result["e1"].points[0], (50.0, 40.0));
        assert_eq!(result["e2"].points[0], (58.0, 40.0));
    }
}
