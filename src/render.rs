use std::path::Path;

use anyhow::Result;

use crate::config::RenderConfig;
use crate::geometry::Point;
use crate::ir::Graph;
use crate::route::RoutingResult;

/// Demo SVG document for the CLI: node boxes, merge circles, labels and the
/// routed edge paths. The real host renders itself; this exists so routing
/// output can be looked at standalone.
pub fn render_svg(graph: &Graph, routes: &RoutingResult, config: &RenderConfig) -> String {
    let (width, height) = document_extent(graph, routes, config.margin);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        config.line_color
    ));
    svg.push_str("</defs>");

    for edge in &graph.edges {
        let Some(routed) = routes.get(&edge.id) else {
            continue;
        };
        if routed.svg_path.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#arrow)\"/>",
            routed.svg_path, config.line_color
        ));
        if let Some(label) = &edge.label
            && let Some((x, y)) = label_anchor(&routed.points)
        {
            let half_width = label.len() as f32 * config.font_size * 0.3 + 6.0;
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\"/>",
                x - half_width,
                y - config.font_size * 0.75 - 2.0,
                half_width * 2.0,
                config.font_size * 1.5,
                config.label_background
            ));
            svg.push_str(&text_svg(x, y, label, config));
        }
    }

    for node in graph.nodes.values() {
        if node.is_merge {
            let (cx, cy) = node.center();
            let r = node.width.min(node.height) / 2.0;
            svg.push_str(&format!(
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                config.node_fill, config.node_stroke
            ));
        } else {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                node.x, node.y, node.width, node.height, config.node_fill, config.node_stroke
            ));
        }
        if let Some(label) = &node.label {
            let (cx, cy) = node.center();
            svg.push_str(&text_svg(cx, cy, label, config));
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Midpoint of the longest interior segment, where a label obscures the
/// least. Falls back to the whole-path chord on short polylines.
fn label_anchor(points: &[Point]) -> Option<Point> {
    if points.len() < 2 {
        return None;
    }
    let (first, last) = if points.len() >= 4 {
        (1, points.len() - 2)
    } else {
        (0, points.len() - 1)
    };
    let mut best: Option<(f32, Point)> = None;
    for idx in first..last {
        let a = points[idx];
        let b = points[idx + 1];
        let len = (b.0 - a.0).abs() + (b.1 - a.1).abs();
        let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        if best.is_none_or(|(best_len, _)| len > best_len) {
            best = Some((len, mid));
        }
    }
    best.map(|(_, mid)| mid)
}

fn text_svg(x: f32, y: f32, text: &str, config: &RenderConfig) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        config.font_family,
        config.font_size,
        config.text_color,
        escape_xml(text)
    )
}

fn document_extent(graph: &Graph, routes: &RoutingResult, margin: f32) -> (f32, f32) {
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    for node in graph.nodes.values() {
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    for routed in routes.values() {
        for &(x, y) in &routed.points {
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    ((max_x + margin).max(200.0), (max_y + margin).max(200.0))
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{svg}");
        }
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
