use rustc_hash::FxHashMap;

use crate::geometry::{Axis, COORD_EPS, Point, simplify_polyline};

/// Nudge collinear overlapping interior segments apart so edges sharing a
/// corridor stay readable. Port points and stub segments never move; stub
/// lengths stretch or shrink instead so polylines stay orthogonal.
pub fn spread_overlaps(polylines: &mut [Vec<Point>], separation: f32) {
    if separation <= 0.0 || polylines.len() < 2 {
        return;
    }

    let segments = collect_segments(polylines);
    let offsets = assign_offsets(&segments, separation);
    if offsets.is_empty() {
        return;
    }

    for (edge_idx, polyline) in polylines.iter_mut().enumerate() {
        let shifted = apply_offsets(polyline, edge_idx, &offsets);
        if let Some(points) = shifted {
            *polyline = simplify_polyline(&reorthogonalize(&points));
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SegmentRef {
    edge: usize,
    segment: usize,
    axis: Axis,
    coord: f32,
    lo: f32,
    hi: f32,
}

/// Interior segments only: the first (source stub) and last (target stub)
/// segment of each polyline are exempt.
fn collect_segments(polylines: &[Vec<Point>]) -> Vec<SegmentRef> {
    let mut segments = Vec::new();
    for (edge, points) in polylines.iter().enumerate() {
        if points.len() < 4 {
            continue;
        }
        for seg in 1..points.len() - 2 {
            let a = points[seg];
            let b = points[seg + 1];
            if (a.1 - b.1).abs() <= COORD_EPS {
                segments.push(SegmentRef {
                    edge,
                    segment: seg,
                    axis: Axis::Horizontal,
                    coord: a.1,
                    lo: a.0.min(b.0),
                    hi: a.0.max(b.0),
                });
            } else if (a.0 - b.0).abs() <= COORD_EPS {
                segments.push(SegmentRef {
                    edge,
                    segment: seg,
                    axis: Axis::Vertical,
                    coord: a.0,
                    lo: a.1.min(b.1),
                    hi: a.1.max(b.1),
                });
            }
        }
    }
    segments.sort_by(|a, b| {
        axis_rank(a.axis)
            .cmp(&axis_rank(b.axis))
            .then(a.coord.total_cmp(&b.coord))
            .then(a.lo.total_cmp(&b.lo))
            .then(a.edge.cmp(&b.edge))
            .then(a.segment.cmp(&b.segment))
    });
    segments
}

fn axis_rank(axis: Axis) -> u8 {
    match axis {
        Axis::Horizontal => 0,
        Axis::Vertical => 1,
    }
}

/// Sweep each (orientation, coordinate) group into clusters of mutually
/// overlapping ranges (touching counts) and hand every cluster member its
/// center-spread offset.
fn assign_offsets(
    segments: &[SegmentRef],
    separation: f32,
) -> FxHashMap<(usize, usize), (Axis, f32)> {
    let mut offsets = FxHashMap::default();
    let mut group_start = 0;
    while group_start < segments.len() {
        let anchor = segments[group_start];
        let mut group_end = group_start + 1;
        while group_end < segments.len() {
            let probe = segments[group_end];
            if probe.axis != anchor.axis || (probe.coord - anchor.coord).abs() > COORD_EPS {
                break;
            }
            group_end += 1;
        }

        let group = &segments[group_start..group_end];
        let mut cluster_start = 0;
        let mut cluster_hi = f32::NEG_INFINITY;
        for idx in 0..=group.len() {
            let starts_new = idx == group.len() || group[idx].lo > cluster_hi + COORD_EPS;
            if starts_new {
                if idx > cluster_start {
                    emit_cluster(&group[cluster_start..idx], separation, &mut offsets);
                }
                cluster_start = idx;
                cluster_hi = f32::NEG_INFINITY;
            }
            if idx < group.len() {
                cluster_hi = cluster_hi.max(group[idx].hi);
            }
        }

        group_start = group_end;
    }
    offsets
}

fn emit_cluster(
    cluster: &[SegmentRef],
    separation: f32,
    offsets: &mut FxHashMap<(usize, usize), (Axis, f32)>,
) {
    // Rank edges by first appearance in the sweep; clusters touching a single
    // edge are left alone.
    let mut ranks: Vec<usize> = Vec::new();
    for segment in cluster {
        if !ranks.contains(&segment.edge) {
            ranks.push(segment.edge);
        }
    }
    if ranks.len() < 2 {
        return;
    }
    let spread_base = (ranks.len() as f32 - 1.0) / 2.0;
    for segment in cluster {
        let Some(rank) = ranks.iter().position(|&edge| edge == segment.edge) else {
            continue;
        };
        let offset = (rank as f32 - spread_base) * separation;
        offsets.insert((segment.edge, segment.segment), (segment.axis, offset));
    }
}

/// Shift offset segments perpendicular to their axis. Stub junctions (point
/// index 1 and len-2) stay put. Returns `None` when nothing moved.
fn apply_offsets(
    points: &[Point],
    edge: usize,
    offsets: &FxHashMap<(usize, usize), (Axis, f32)>,
) -> Option<Vec<Point>> {
    let last_interior = points.len().checked_sub(2)?;
    let mut shifts: Vec<(f32, f32)> = vec![(0.0, 0.0); points.len()];
    let mut moved = false;
    for seg in 1..points.len().saturating_sub(2) {
        let Some(&(axis, offset)) = offsets.get(&(edge, seg)) else {
            continue;
        };
        if offset.abs() <= COORD_EPS {
            continue;
        }
        moved = true;
        for idx in [seg, seg + 1] {
            if idx == 1 || idx == last_interior {
                continue;
            }
            match axis {
                Axis::Horizontal => shifts[idx].1 = offset,
                Axis::Vertical => shifts[idx].0 = offset,
            }
        }
    }
    if !moved {
        return None;
    }
    Some(
        points
            .iter()
            .zip(&shifts)
            .map(|(&(x, y), &(dx, dy))| (x + dx, y + dy))
            .collect(),
    )
}

/// Repair diagonals left by pinned stub junctions. Next to a stub the stub
/// end slides along its own axis (the stub stretches, no new bend);
/// elsewhere a corner waypoint is inserted.
fn reorthogonalize(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    let mut out: Vec<Point> = Vec::with_capacity(n + 2);
    out.push(points[0]);
    for idx in 1..n {
        let prev = out[out.len() - 1];
        let cur = points[idx];
        if (prev.0 - cur.0).abs() <= COORD_EPS || (prev.1 - cur.1).abs() <= COORD_EPS {
            out.push(cur);
            continue;
        }
        if idx == 2 {
            // Diagonal between the source stub end and the first interior
            // point: stretch the stub to meet it.
            let source_stub_vertical = (points[0].0 - points[1].0).abs() <= COORD_EPS;
            let last = out.len() - 1;
            if source_stub_vertical {
                out[last].1 = cur.1;
            } else {
                out[last].0 = cur.0;
            }
            out.push(cur);
            continue;
        }
        if idx == n - 2 {
            // Mirror case at the target: slide the target stub end along the
            // target stub axis.
            let target_stub_vertical = (points[n - 1].0 - points[n - 2].0).abs() <= COORD_EPS;
            let fixed = if target_stub_vertical {
                (cur.0, prev.1)
            } else {
                (prev.0, cur.1)
            };
            out.push(fixed);
            continue;
        }
        // Interior diagonal: keep the incoming direction through the corner.
        let incoming_horizontal = out.len() >= 2 && {
            let before = out[out.len() - 2];
            (before.1 - prev.1).abs() <= COORD_EPS
        };
        if incoming_horizontal {
            out.push((cur.0, prev.1));
        } else {
            out.push((prev.0, cur.1));
        }
        out.push(cur);
    }
    out
}
