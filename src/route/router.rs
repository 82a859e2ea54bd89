use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::RoutingConfig;
use crate::geometry::{Axis, InflatedRect, Point, Rect, simplify_polyline};
use crate::ir::Side;

use super::grid::VisibilityGrid;

/// One routing request: resolved port positions and stub directions for a
/// single edge. Obstacles must already exclude the endpoint nodes.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub source: Point,
    pub source_dir: Side,
    pub target: Point,
    pub target_dir: Side,
}

/// Route one edge through the visibility graph. Never fails: unreachable
/// targets and stub endpoints buried inside obstacles degrade to the S-shape
/// fallback.
pub fn route_edge(spec: &RouteSpec, obstacles: &[Rect], config: &RoutingConfig) -> Vec<Point> {
    let stub_src = offset_point(
        spec.source,
        spec.source_dir,
        config.source_stub_length.max(0.0),
    );
    let stub_tgt = offset_point(
        spec.target,
        spec.target_dir,
        config.target_stub_length.max(0.0),
    );

    let padding = config.padding.max(0.0);
    let inflated: Vec<InflatedRect> = obstacles.iter().map(|rect| rect.inflate(padding)).collect();

    let Some(grid) = VisibilityGrid::build(stub_src, stub_tgt, &inflated) else {
        return fallback_route(spec, stub_src, stub_tgt);
    };

    match shortest_path(&grid, spec, config) {
        Some(interior) => {
            let mut points = Vec::with_capacity(interior.len() + 2);
            points.push(spec.source);
            points.extend(interior);
            points.push(spec.target);
            simplify_polyline(&points)
        }
        None => fallback_route(spec, stub_src, stub_tgt),
    }
}

/// Stub endpoint: the port pushed outward along its declared direction.
pub fn offset_point(point: Point, dir: Side, length: f32) -> Point {
    let (dx, dy) = dir.outward();
    (point.0 + dx * length, point.1 + dy * length)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SearchEntry {
    cost: f32,
    node: usize,
    axis: Axis,
}

impl Eq for SearchEntry {}

impl Ord for SearchEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: lowest cost wins, cost ties resolve to
        // the earliest-inserted waypoint (indices are (x, y)-lexicographic).
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
            .then_with(|| axis_bit(other.axis).cmp(&axis_bit(self.axis)))
    }
}

impl PartialOrd for SearchEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn axis_bit(axis: Axis) -> usize {
    match axis {
        Axis::Horizontal => 0,
        Axis::Vertical => 1,
    }
}

fn state(node: usize, axis: Axis) -> usize {
    node * 2 + axis_bit(axis)
}

fn shortest_path(
    grid: &VisibilityGrid,
    spec: &RouteSpec,
    config: &RoutingConfig,
) -> Option<Vec<Point>> {
    let states = grid.points.len() * 2;
    let mut best = vec![f32::INFINITY; states];
    let mut previous: Vec<Option<usize>> = vec![None; states];
    let mut heap = BinaryHeap::new();

    // The stub seeds the incoming axis, so the first turn off it is already
    // charged as a bend.
    let start_axis = if spec.source_dir.is_vertical() {
        Axis::Vertical
    } else {
        Axis::Horizontal
    };
    best[state(grid.source, start_axis)] = 0.0;
    heap.push(SearchEntry {
        cost: 0.0,
        node: grid.source,
        axis: start_axis,
    });

    let bend_penalty = config.bend_penalty.max(0.0);
    let bias = config.early_bend_bias.max(0.0);

    while let Some(SearchEntry { cost, node, axis }) = heap.pop() {
        let here = state(node, axis);
        if cost > best[here] {
            continue;
        }
        if node == grid.target {
            return Some(reconstruct(grid, &previous, here));
        }
        for edge in &grid.adjacency[node] {
            let mut next_cost = cost + edge.len;
            if edge.axis != axis {
                next_cost += bend_penalty;
            }
            if edge.axis == Axis::Horizontal && bias > 0.0 {
                // Horizontal runs below the source get progressively more
                // expensive, pulling the bend toward the source. Clamped at
                // zero so edge weights stay non-negative; note the bias
                // applies to every horizontal segment, not just those
                // between source and target.
                next_cost += bias * (grid.points[node].1 - spec.source.1).max(0.0);
            }
            let next = state(edge.to, edge.axis);
            if next_cost < best[next] {
                best[next] = next_cost;
                previous[next] = Some(here);
                heap.push(SearchEntry {
                    cost: next_cost,
                    node: edge.to,
                    axis: edge.axis,
                });
            }
        }
    }

    None
}

fn reconstruct(grid: &VisibilityGrid, previous: &[Option<usize>], end: usize) -> Vec<Point> {
    let mut points = Vec::new();
    let mut cursor = Some(end);
    while let Some(state_idx) = cursor {
        points.push(grid.points[state_idx / 2]);
        cursor = previous[state_idx];
    }
    points.reverse();
    points
}

/// The S-shape of last resort: `[port, stubSrc, mid*, stubTgt, port]`. Same
/// stub axes split at the average coordinate; mixed axes need only a single
/// corner.
fn fallback_route(spec: &RouteSpec, stub_src: Point, stub_tgt: Point) -> Vec<Point> {
    let mut points = vec![spec.source, stub_src];
    match (spec.source_dir.is_vertical(), spec.target_dir.is_vertical()) {
        (true, true) => {
            let mid_y = (stub_src.1 + stub_tgt.1) / 2.0;
            points.push((stub_src.0, mid_y));
            points.push((stub_tgt.0, mid_y));
        }
        (false, false) => {
            let mid_x = (stub_src.0 + stub_tgt.0) / 2.0;
            points.push((mid_x, stub_src.1));
            points.push((mid_x, stub_tgt.1));
        }
        (true, false) => points.push((stub_src.0, stub_tgt.1)),
        (false, true) => points.push((stub_tgt.0, stub_src.1)),
    }
    points.push(stub_tgt);
    points.push(spec.target);
    simplify_polyline(&points)
}
