use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::RoutingOverrides;
use crate::geometry::Point;

/// Fixed spacing between synthesised ports on one node side. Every layer that
/// computes a port position goes through [`NodeSpec::port_position`] so the
/// offset formula cannot drift between routing and layout.
pub const PORT_SPACING: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Stub axis: top/bottom ports emit vertical stubs.
    pub fn is_vertical(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    /// Unit vector pointing away from the node.
    pub fn outward(self) -> (f32, f32) {
        match self {
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
        }
    }
}

/// A measured handle, relative to the node's top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleSpec {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    pub side: Side,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandleBounds {
    #[serde(default)]
    pub source: Vec<HandleSpec>,
    #[serde(default)]
    pub target: Vec<HandleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub is_merge: bool,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_bounds: Option<HandleBounds>,
}

impl NodeSpec {
    pub fn center(&self) -> Point {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Midpoint of one side in world coordinates.
    pub fn side_midpoint(&self, side: Side) -> Point {
        let (cx, cy) = self.center();
        match side {
            Side::Top => (cx, self.y),
            Side::Bottom => (cx, self.y + self.height),
            Side::Left => (self.x, cy),
            Side::Right => (self.x + self.width, cy),
        }
    }

    /// Default port-layout formula: the i-th of `count` handles sits at
    /// perpendicular offset `(i - (count - 1) / 2) * PORT_SPACING` from the
    /// side midpoint.
    pub fn port_position(&self, side: Side, index: usize, count: usize) -> Point {
        let count = count.max(1);
        let offset = (index as f32 - (count as f32 - 1.0) / 2.0) * PORT_SPACING;
        let (mx, my) = self.side_midpoint(side);
        if side.is_vertical() {
            (mx + offset, my)
        } else {
            (mx, my + offset)
        }
    }

    /// Centre and side of a measured handle, if the host provided one.
    pub fn measured_handle(&self, handle_id: &str, source_side: bool) -> Option<(Point, Side)> {
        let bounds = self.handle_bounds.as_ref()?;
        let list = if source_side {
            &bounds.source
        } else {
            &bounds.target
        };
        let handle = list.iter().find(|handle| handle.id == handle_id)?;
        let position = (
            self.x + handle.x + handle.width / 2.0,
            self.y + handle.y + handle.height / 2.0,
        );
        Some((position, handle.side))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub id: String,
    #[serde(rename = "sourceNodeId")]
    pub source: String,
    #[serde(
        rename = "sourceHandleId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_handle: Option<String>,
    #[serde(rename = "targetNodeId")]
    pub target: String,
    #[serde(
        rename = "targetHandleId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        rename = "routingConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub routing: Option<RoutingOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

impl EdgeSpec {
    /// Sibling-order key: the explicit `order` hint wins, else the source
    /// handle index, else declaration position (supplied by the caller).
    pub fn order_key(&self, declaration: usize) -> usize {
        self.order
            .or_else(|| self.source_handle.as_deref().and_then(handle_index))
            .unwrap_or(declaration)
    }
}

/// Index carried by the `output-<i>` / `input-<i>` handle-id convention.
pub fn handle_index(handle_id: &str) -> Option<usize> {
    let digits = handle_id
        .rsplit_once('-')
        .map(|(_, tail)| tail)
        .unwrap_or(handle_id);
    digits.parse().ok()
}

/// Host-facing diagram: node records keyed by id plus the edge list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: BTreeMap<String, NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, node: NodeSpec) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Highest source-handle index referenced on `node_id`, as a count. Used
    /// to synthesise port positions when the host has not measured handles.
    pub fn source_fan(&self, node_id: &str) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.source == node_id)
            .filter_map(|edge| edge.source_handle.as_deref().and_then(handle_index))
            .map(|index| index + 1)
            .max()
            .unwrap_or(1)
    }

    pub fn target_fan(&self, node_id: &str) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.target == node_id)
            .filter_map(|edge| edge.target_handle.as_deref().and_then(handle_index))
            .map(|index| index + 1)
            .max()
            .unwrap_or(1)
    }
}

#[derive(Debug, Deserialize)]
struct GraphFile {
    nodes: Vec<NodeSpec>,
    edges: Vec<EdgeSpec>,
}

pub fn parse_graph(input: &str) -> anyhow::Result<Graph> {
    let file: GraphFile = serde_json::from_str(input)?;
    let mut graph = Graph::new();
    for node in file.nodes {
        graph.insert_node(node);
    }
    graph.edges = file.edges;
    Ok(graph)
}
