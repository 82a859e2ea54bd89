use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::ir::Graph;
use crate::route::RoutingResult;

#[derive(Debug, Serialize)]
pub struct RoutingDump {
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub is_merge: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub points: Vec<PointDump>,
    pub svg_path: String,
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct PointDump {
    pub x: f32,
    pub y: f32,
}

impl RoutingDump {
    pub fn from_result(graph: &Graph, result: &RoutingResult) -> Self {
        let nodes = graph
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                is_merge: node.is_merge,
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .filter_map(|edge| {
                let routed = result.get(&edge.id)?;
                Some(EdgeDump {
                    id: edge.id.clone(),
                    source_node_id: edge.source.clone(),
                    target_node_id: edge.target.clone(),
                    points: routed
                        .points
                        .iter()
                        .map(|&(x, y)| PointDump { x, y })
                        .collect(),
                    svg_path: routed.svg_path.clone(),
                    fallback: routed.is_fallback(),
                })
            })
            .collect();

        RoutingDump { nodes, edges }
    }
}

pub fn write_routing_dump(
    dump: &RoutingDump,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            let text = serde_json::to_string_pretty(dump)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }
    Ok(())
}
